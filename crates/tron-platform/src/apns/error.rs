//! APNS error type.

use thiserror::Error;

/// Errors from constructing or driving the APNs HTTP/2 client.
#[derive(Debug, Error)]
pub enum ApnsError {
    /// Failed to read the `.p8` private key file.
    #[error("failed to read APNS key file: {0}")]
    Io(#[from] std::io::Error),

    /// The key file is not a valid ES256 private key, or token signing failed.
    #[error("failed to sign provider token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The underlying HTTP client failed to build or send a request.
    #[error("APNS request failed: {0}")]
    Http(#[from] reqwest::Error),
}
