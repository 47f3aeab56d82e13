//! Purpose: Typed JSON mapping for the Service Fabric REST gateway, plus a thin HTTP client.
//! Exports: `core` (mapping engine and errors), `model` (wire types), `api` (gateway client).
//! Role: Library backing the `sfwire` CLI and usable on its own.
//! Invariants: Decoding never panics on untrusted input; every failure is a typed `Error`.
//! Invariants: Unknown properties are skipped; unknown enumeration or discriminator values are errors.
pub mod api;
pub mod core;
pub mod model;

pub use crate::core::codec::{
    from_reader, from_slice, from_str, from_value, to_string, to_string_pretty, to_value,
    to_writer,
};
pub use crate::core::error::{Error, ErrorKind};
