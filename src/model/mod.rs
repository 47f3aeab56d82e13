//! Purpose: Typed Service Fabric wire models, grouped by REST surface.
//! Exports: One module per surface plus the by-name `catalog`.
//! Role: Declarative tables over the `core` engine; no hand-written converters except `PagedList`.
pub mod catalog;
pub mod health;
pub mod image_store;
pub mod paged;
pub mod partition;
pub mod service;
pub mod upgrade;

pub use paged::PagedList;
