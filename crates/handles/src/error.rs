use tfsgate_client::{ClientError, OpenMode};
use tfsgate_transfer::TransferError;

use crate::Fd;

/// Errors produced by the descriptor API.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("unknown file descriptor {0}")]
    UnknownFd(Fd),

    #[error("descriptor {fd} is open for {mode}")]
    WrongMode { fd: Fd, mode: OpenMode },

    #[error("no data to write")]
    EmptyData,

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
