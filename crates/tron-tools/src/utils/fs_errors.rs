//! Maps filesystem I/O errors to user-facing tool results.

use std::io;

use tron_core::tools::{TronToolResult, error_result};

/// Turn an `io::Error` encountered while `action`-ing `path` into an error result.
pub fn format_fs_error(err: &io::Error, path: &str, action: &str) -> TronToolResult {
    let message = match err.kind() {
        io::ErrorKind::NotFound => format!("File not found: {path}"),
        io::ErrorKind::PermissionDenied => format!("Permission denied {action} {path}"),
        io::ErrorKind::AlreadyExists => format!("Already exists: {path}"),
        _ if err.raw_os_error() == Some(21) => format!("Is a directory: {path}"),
        _ if err.raw_os_error() == Some(20) => format!("Not a directory: {path}"),
        _ => format!("Error {action} {path}: {err}"),
    };
    error_result(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let result = format_fs_error(&err, "/tmp/missing", "reading");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn permission_denied_message() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let result = format_fs_error(&err, "/root/secret", "writing");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn generic_error_includes_action_and_path() {
        let err = io::Error::other("boom");
        let result = format_fs_error(&err, "/tmp/x", "creating directory");
        assert_eq!(result.is_error, Some(true));
    }
}
