//! Traits for the externally supplied TFS client.

use crate::{ClientError, FileName, FileStat, OpenMode, UnlinkAction};

/// One open remote file.
///
/// A handle is bound to a single file and a single [`OpenMode`] for its
/// whole lifetime and must not be shared between concurrent transfers.
/// Every call blocks until the underlying client returns.
pub trait RemoteFile: Send {
    /// Mode the handle was opened in.
    fn mode(&self) -> OpenMode;

    /// Returns size and recorded checksum. Read mode only.
    fn stat(&mut self) -> Result<FileStat, ClientError>;

    /// Reads up to `buf.len()` bytes from the current position.
    ///
    /// `Ok(0)` is a legal return that makes no progress. An `Err` is the
    /// client's negative status code.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError>;

    /// Offers `buf` to the file and returns the count the client reports
    /// it accepted. The count is not guaranteed to be `<= buf.len()`.
    fn write(&mut self, buf: &[u8]) -> Result<usize, ClientError>;

    /// Releases the handle.
    ///
    /// In write mode this commits the file and returns its assigned name;
    /// the data is not durable until this succeeds. In read mode it
    /// returns the name the file was opened with.
    fn close(&mut self) -> Result<FileName, ClientError>;

    /// Releases the handle after a failed transfer.
    ///
    /// Unlike [`close`](RemoteFile::close), nothing written through the
    /// handle is committed.
    fn abort(&mut self) -> Result<(), ClientError>;
}

/// A connected client session against one name server.
pub trait Session: Send + Sync {
    type File: RemoteFile;

    /// Opens a remote file.
    ///
    /// `name = None` in [`OpenMode::Write`] asks the cluster to assign a
    /// new name on close. Reads always need a name.
    fn open(
        &self,
        name: Option<&FileName>,
        suffix: Option<&str>,
        mode: OpenMode,
    ) -> Result<Self::File, ClientError>;

    /// Changes the visibility of a file and returns its size.
    fn unlink(
        &self,
        name: &FileName,
        suffix: Option<&str>,
        action: UnlinkAction,
    ) -> Result<i64, ClientError>;
}

/// Creates sessions from a name-server address (`ip:port`).
pub trait Connector: Send + Sync {
    type Session: Session;

    fn connect(&self, addr: &str) -> Result<Self::Session, ClientError>;
}
