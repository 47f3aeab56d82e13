// Core mapping engine: wire rules, record plumbing, dispatch contracts, and errors.
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod path;
pub mod record;
pub(crate) mod schema;
pub mod value;
