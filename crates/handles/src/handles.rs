use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tfsgate_client::{ClientError, FileName, OpenMode, RemoteFile, Session, UnlinkAction};
use tfsgate_transfer::{TransferEngine, TransferError};
use tracing::{debug, warn};

use crate::HandleError;

/// A descriptor for a file opened through [`TfsHandles`]. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(i32);

impl Fd {
    pub fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a descriptor holds between calls.
enum Entry<F> {
    /// Read descriptors keep the name so each read can reopen the file.
    /// `file` is the handle from `open`, until the first read uses it.
    Read {
        name: FileName,
        suffix: Option<String>,
        file: Option<F>,
    },
    Write(F),
}

impl<F> Entry<F> {
    fn mode(&self) -> OpenMode {
        match self {
            Entry::Read { .. } => OpenMode::Read,
            Entry::Write(_) => OpenMode::Write,
        }
    }
}

struct FdTable<F> {
    next: i32,
    open: HashMap<Fd, Entry<F>>,
}

impl<F> FdTable<F> {
    fn insert(&mut self, entry: Entry<F>) -> Fd {
        let fd = Fd(self.next);
        self.next = if self.next == i32::MAX { 1 } else { self.next + 1 };
        self.open.insert(fd, entry);
        fd
    }
}

/// Descriptor table over one session.
///
/// A write descriptor serves one transfer at a time: its file is taken
/// out of the table while a write runs, so a concurrent call on the same
/// descriptor sees [`HandleError::UnknownFd`]. Read descriptors open a
/// fresh remote handle for every read.
pub struct TfsHandles<S: Session> {
    session: Arc<S>,
    engine: TransferEngine,
    table: Mutex<FdTable<S::File>>,
}

impl<S: Session> TfsHandles<S> {
    pub fn new(session: Arc<S>, engine: TransferEngine) -> Self {
        Self {
            session,
            engine,
            table: Mutex::new(FdTable {
                next: 1,
                open: HashMap::new(),
            }),
        }
    }

    /// Opens a remote file. Pass `name = None` with [`OpenMode::Write`]
    /// to create a new file.
    pub fn open(
        &self,
        name: Option<&FileName>,
        suffix: Option<&str>,
        mode: OpenMode,
    ) -> Result<Fd, HandleError> {
        let read_name = match (mode, name) {
            (OpenMode::Read, None) => {
                return Err(ClientError::InvalidName(
                    "a name is required to open for reading".into(),
                )
                .into());
            }
            (OpenMode::Read, Some(name)) => Some(name.clone()),
            (OpenMode::Write, _) => None,
        };

        let file = self.session.open(name, suffix, mode)?;
        let entry = match read_name {
            Some(name) => Entry::Read {
                name,
                suffix: suffix.map(str::to_owned),
                file: Some(file),
            },
            None => Entry::Write(file),
        };

        let fd = self.lock().insert(entry);
        debug!(%fd, %mode, "descriptor opened");
        Ok(fd)
    }

    /// Appends `data` to a file opened for writing.
    ///
    /// A failed write aborts and discards the descriptor so the partial
    /// data can never be committed.
    pub fn write(&self, fd: Fd, data: &[u8]) -> Result<usize, HandleError> {
        if data.is_empty() {
            return Err(HandleError::EmptyData);
        }

        let mut file = self.take_writer(fd)?;
        match self.engine.write(&mut file, data) {
            Ok(n) => {
                self.lock().open.insert(fd, Entry::Write(file));
                Ok(n)
            }
            Err(e) => {
                warn!(%fd, error = %e, "write failed, descriptor discarded");
                abort(fd, &mut file);
                Err(e.into())
            }
        }
    }

    /// Reads and verifies the whole file behind a read descriptor.
    ///
    /// The client library only reads from the start of a file, so every
    /// call reads through a fresh handle and returns the complete
    /// contents. A failed read leaves the descriptor usable.
    pub fn read(&self, fd: Fd) -> Result<Vec<u8>, HandleError> {
        let (name, suffix, opened) = match self.lock().open.get_mut(&fd) {
            None => return Err(HandleError::UnknownFd(fd)),
            Some(Entry::Write(_)) => {
                return Err(HandleError::WrongMode {
                    fd,
                    mode: OpenMode::Write,
                });
            }
            Some(Entry::Read { name, suffix, file }) => (name.clone(), suffix.clone(), file.take()),
        };

        let mut file = match opened {
            Some(file) => file,
            None => self
                .session
                .open(Some(&name), suffix.as_deref(), OpenMode::Read)?,
        };

        let data = match self.engine.read_file(&mut file) {
            Ok(data) => data,
            Err(e) => {
                abort(fd, &mut file);
                return Err(e.into());
            }
        };

        if let Err(e) = file.close() {
            warn!(%fd, %name, error = %e, "close after read failed");
        }
        Ok(data)
    }

    /// Closes a descriptor. For write descriptors this commits the file
    /// and returns its assigned name.
    pub fn close(&self, fd: Fd) -> Result<FileName, HandleError> {
        let entry = self
            .lock()
            .open
            .remove(&fd)
            .ok_or(HandleError::UnknownFd(fd))?;

        let name = match entry {
            Entry::Write(mut file) => file
                .close()
                .map_err(|source| TransferError::FinalizeFailure { source })?,
            Entry::Read {
                file: Some(mut file),
                ..
            } => file.close()?,
            Entry::Read {
                name, file: None, ..
            } => name,
        };

        debug!(%fd, %name, "descriptor closed");
        Ok(name)
    }

    /// Stores `data` as a new file in one call.
    pub fn put(&self, data: &[u8], suffix: Option<&str>) -> Result<FileName, HandleError> {
        if data.is_empty() {
            return Err(HandleError::EmptyData);
        }
        Ok(tfsgate_transfer::put(
            self.session.as_ref(),
            data,
            suffix,
            &self.engine,
        )?)
    }

    /// Fetches a whole file in one call.
    pub fn get(&self, name: &FileName, suffix: Option<&str>) -> Result<Vec<u8>, HandleError> {
        Ok(tfsgate_transfer::get(
            self.session.as_ref(),
            name,
            suffix,
            &self.engine,
        )?)
    }

    /// Applies `action` to a file and returns its size.
    pub fn unlink(
        &self,
        name: &FileName,
        suffix: Option<&str>,
        action: UnlinkAction,
    ) -> Result<i64, HandleError> {
        Ok(self.session.unlink(name, suffix, action)?)
    }

    /// Number of descriptors currently open.
    pub fn open_count(&self) -> usize {
        self.lock().open.len()
    }

    fn take_writer(&self, fd: Fd) -> Result<S::File, HandleError> {
        let mut table = self.lock();
        let mode = table
            .open
            .get(&fd)
            .map(Entry::mode)
            .ok_or(HandleError::UnknownFd(fd))?;
        if mode != OpenMode::Write {
            return Err(HandleError::WrongMode { fd, mode });
        }
        match table.open.remove(&fd) {
            Some(Entry::Write(file)) => Ok(file),
            _ => Err(HandleError::UnknownFd(fd)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FdTable<S::File>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn abort<F: RemoteFile>(fd: Fd, file: &mut F) {
    if let Err(e) = file.abort() {
        warn!(%fd, error = %e, "releasing handle after failed transfer failed");
    }
}
