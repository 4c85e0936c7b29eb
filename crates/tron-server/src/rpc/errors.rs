//! RPC error codes and error type.
//!
//! Re-exported from `tron_rpc::errors` — the standalone `tron-rpc` crate
//! already defines the wire error codes and `RpcError` type shared with the
//! iOS client across the whole workspace, so handlers here use the same one
//! rather than a parallel copy.

pub use tron_rpc::errors::{
    ALREADY_EXISTS, BROWSER_ERROR, CANVAS_ERROR, FILESYSTEM_ERROR, FILE_ERROR, FILE_NOT_FOUND,
    GIT_ERROR, INTERNAL_ERROR, INVALID_OPERATION, INVALID_PARAMS, INVALID_PATH,
    MAX_SESSIONS_REACHED, MESSAGE_ERROR, METHOD_NOT_FOUND, NOT_AVAILABLE, NOT_FOUND,
    PERMISSION_DENIED, REGISTRATION_ERROR, RpcError, SESSION_NOT_ACTIVE, SESSION_NOT_FOUND,
    SKILL_ERROR, TOOL_RESULT_FAILED, TRANSCRIPTION_ERROR, VOICE_NOTE_ERROR,
};
