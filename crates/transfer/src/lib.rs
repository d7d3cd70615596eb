//! Chunked file transfer between a local buffer and a TFS remote file.
//!
//! Reads are verified against the CRC recorded in the file's metadata;
//! a read that fails verification is an error, never a suspect success.
//! Writes end with the finalize-and-name step in [`put`].

mod descriptor;
mod engine;
mod error;
mod ops;
mod progress;

pub use descriptor::{Direction, TransferDescriptor};
pub use engine::{
    MAX_IDLE_CALLS, TransferEngine, WritePolicy, read_file, transfer_read, transfer_read_into,
    transfer_write,
};
pub use error::{IoFault, TransferError};
pub use ops::{get, put, stat};
pub use progress::{Progress, ProgressCallback};

/// Default chunk size: 2 MiB.
///
/// Bounds the size of each read/write call handed to the client library.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;
