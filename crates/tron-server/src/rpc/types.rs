//! RPC wire-format types matching the iOS WebSocket protocol.
//!
//! Re-exported from `tron_rpc::types` so the request/response/event shapes
//! on the wire are identical whether a message crosses this crate's own
//! `MethodRegistry` dispatch path or the standalone `tron-rpc` protocol
//! crate used elsewhere in the workspace.

pub use tron_rpc::types::{RpcErrorBody, RpcErrorCategory, RpcEvent, RpcRequest, RpcResponse};
