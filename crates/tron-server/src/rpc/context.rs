//! RPC dependency-injection context.
//!
//! Re-exports the canonical types from `tron-rpc`; kept as a module here so
//! existing `crate::rpc::context` imports in this crate don't need touching.

pub use tron_rpc::context::{AgentDeps, RpcContext};
