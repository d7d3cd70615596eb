//! Client error types.

use crate::name::FileName;

/// Errors reported by the TFS client primitives.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Negative status code returned by the client library.
    #[error("tfs error code {0}")]
    Code(i32),

    #[error("file not found: {0}")]
    NotFound(FileName),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("operation not allowed in this open mode")]
    WrongMode,

    #[error("file handle already closed")]
    Closed,

    #[error("cannot connect to name server {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("request rejected: {0}")]
    Rejected(String),
}
