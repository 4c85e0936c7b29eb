//! Method registry and async dispatch.
//!
//! Re-exports the canonical types from `tron-rpc`; kept as a module here so
//! existing `crate::rpc::registry` imports in this crate don't need touching.

pub use tron_rpc::registry::{MethodHandler, MethodRegistry};
