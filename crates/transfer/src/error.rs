use tfsgate_client::ClientError;

/// Why a single read or write primitive call ended the transfer.
#[derive(Debug, thiserror::Error)]
pub enum IoFault {
    /// The client returned a negative status.
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("primitive reported {reported} bytes for a {requested}-byte request")]
    Overrun { requested: usize, reported: usize },

    #[error("no progress after {0} consecutive calls")]
    Stalled(u32),
}

/// Errors produced by the transfer engine and its compositions.
///
/// Failures that happen mid-loop carry `moved`, the number of bytes the
/// transfer had completed when it stopped.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid file metadata: size {size}")]
    InvalidMetadata { size: i64 },

    #[error("chunk size must be positive")]
    InvalidChunkSize,

    #[error("read failed after {moved} bytes: {cause}")]
    ReadFailure {
        moved: u64,
        #[source]
        cause: IoFault,
    },

    #[error("write failed after {moved} bytes: {cause}")]
    WriteFailure {
        moved: u64,
        #[source]
        cause: IoFault,
    },

    #[error("checksum mismatch after {moved} bytes: expected {expected:#010x}, got {actual:#010x}")]
    IntegrityFailure { moved: u64, expected: u32, actual: u32 },

    #[error("commit failed: {source}")]
    FinalizeFailure { source: ClientError },

    #[error("open failed: {0}")]
    Open(#[source] ClientError),

    #[error("stat failed: {0}")]
    Stat(#[source] ClientError),

    #[error("close failed: {0}")]
    CloseFailure(#[source] ClientError),
}

impl TransferError {
    /// Bytes moved before the failure, where the failure happened inside
    /// a transfer loop.
    pub fn bytes_moved(&self) -> Option<u64> {
        match self {
            TransferError::ReadFailure { moved, .. }
            | TransferError::WriteFailure { moved, .. }
            | TransferError::IntegrityFailure { moved, .. } => Some(*moved),
            _ => None,
        }
    }
}
