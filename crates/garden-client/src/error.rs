//! Error types for the Garden client.

use thiserror::Error;

/// Errors returned by [`crate::LifecycleClient`] implementations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure talking to the server.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Garden returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Failed to decode Garden response: {0}")]
    Decode(String),

    /// The server rejected or failed the operation.
    #[error("Garden operation failed: {0}")]
    Operation(String),
}
