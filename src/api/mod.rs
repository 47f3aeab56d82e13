//! Purpose: Public client surface for talking to a Service Fabric gateway.
//! Exports: `FabricClient`, `ClientConfig`, `DEFAULT_API_VERSION`.
//! Role: Thin transport over the typed models; owns no state beyond the HTTP agent.
//! Invariants: Errors are the crate `Error`, with gateway status and code preserved.

mod client;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use client::{ClientConfig, DEFAULT_API_VERSION, FabricClient};
