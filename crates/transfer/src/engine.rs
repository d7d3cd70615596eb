//! The chunked read/write loops.
//!
//! Both directions share one shape: ask for `min(remaining, chunk_size)`
//! bytes, advance by what the primitive reports, stop the moment the
//! primitive signals an error. Nothing is retried here.

use serde::{Deserialize, Serialize};
use tfsgate_client::{ChecksumAlgorithm, Crc32, RemoteFile};
use tracing::{debug, warn};

use crate::descriptor::{Direction, TransferDescriptor};
use crate::error::{IoFault, TransferError};
use crate::progress::ProgressCallback;
use crate::DEFAULT_CHUNK_SIZE;

/// Consecutive zero-byte primitive calls tolerated before a transfer is
/// declared stalled.
pub const MAX_IDLE_CALLS: u32 = 16;

/// How the write loop treats a primitive reporting more than it was offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Over-reporting is a protocol violation and fails the write.
    #[default]
    Strict,
    /// A report of at least the remaining length completes the write,
    /// whatever was actually offered in that call.
    Lenient,
}

/// Stateless transfer configuration.
///
/// One engine may serve any number of sequential or concurrent transfers;
/// all per-transfer state lives in a [`TransferDescriptor`] on the stack.
pub struct TransferEngine<C = Crc32> {
    chunk_size: usize,
    policy: WritePolicy,
    checksum: C,
    on_progress: Option<ProgressCallback>,
}

impl TransferEngine<Crc32> {
    /// Creates an engine using CRC-32 and [`WritePolicy::Strict`].
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (2 MiB) is used.
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            chunk_size,
            policy: WritePolicy::default(),
            checksum: Crc32,
            on_progress: None,
        }
    }

    /// Like [`new`](Self::new), but a zero `chunk_size` is an error
    /// instead of a request for the default.
    pub fn try_new(chunk_size: usize) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        Ok(Self::new(chunk_size))
    }
}

impl Default for TransferEngine<Crc32> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl<C: ChecksumAlgorithm> TransferEngine<C> {
    /// Swaps the checksum algorithm. It must match the one the writer
    /// used when the file was created.
    pub fn with_checksum<D: ChecksumAlgorithm>(self, checksum: D) -> TransferEngine<D> {
        TransferEngine {
            chunk_size: self.chunk_size,
            policy: self.policy,
            checksum,
            on_progress: self.on_progress,
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a callback invoked after every chunk that moved bytes.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Reads exactly `total_size` bytes and verifies them against
    /// `expected_crc`.
    pub fn read<F: RemoteFile + ?Sized>(
        &self,
        file: &mut F,
        total_size: i64,
        expected_crc: u32,
    ) -> Result<Vec<u8>, TransferError> {
        let len = usize::try_from(total_size)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(TransferError::InvalidMetadata { size: total_size })?;

        let mut buf = vec![0u8; len];
        self.read_into(file, &mut buf, expected_crc)?;
        Ok(buf)
    }

    /// Fills the whole of `buf` from `file` and verifies it.
    ///
    /// On any error the contents of `buf` must not be trusted.
    pub fn read_into<F: RemoteFile + ?Sized>(
        &self,
        file: &mut F,
        buf: &mut [u8],
        expected_crc: u32,
    ) -> Result<usize, TransferError> {
        if buf.is_empty() {
            return Err(TransferError::InvalidMetadata { size: 0 });
        }

        let mut desc = TransferDescriptor::new(Direction::Read, buf.len() as u64, self.chunk_size);
        let mut idle = 0u32;

        while !desc.is_complete() {
            let start = desc.bytes_moved() as usize;
            let want = desc.next_request();

            let n = match file.read(&mut buf[start..start + want]) {
                Ok(n) => n,
                Err(e) => {
                    warn!(moved = desc.bytes_moved(), error = %e, "read primitive failed");
                    return Err(TransferError::ReadFailure {
                        moved: desc.bytes_moved(),
                        cause: e.into(),
                    });
                }
            };

            if n > want {
                return Err(TransferError::ReadFailure {
                    moved: desc.bytes_moved(),
                    cause: IoFault::Overrun {
                        requested: want,
                        reported: n,
                    },
                });
            }

            if n == 0 {
                idle += 1;
                if idle >= MAX_IDLE_CALLS {
                    return Err(TransferError::ReadFailure {
                        moved: desc.bytes_moved(),
                        cause: IoFault::Stalled(idle),
                    });
                }
                continue;
            }
            idle = 0;

            desc.fold(&self.checksum, &buf[start..start + n]);
            desc.advance(n);
            self.notify(&desc);
        }

        let actual = desc.running_checksum();
        if actual != expected_crc {
            warn!(
                size = desc.total_size(),
                expected = expected_crc,
                actual,
                "checksum mismatch"
            );
            return Err(TransferError::IntegrityFailure {
                moved: desc.bytes_moved(),
                expected: expected_crc,
                actual,
            });
        }

        debug!(size = desc.total_size(), crc = actual, "read verified");
        Ok(desc.bytes_moved() as usize)
    }

    /// Stats `file` and reads its full contents with verification.
    pub fn read_file<F: RemoteFile + ?Sized>(&self, file: &mut F) -> Result<Vec<u8>, TransferError> {
        let stat = file.stat().map_err(TransferError::Stat)?;
        if stat.size <= 0 {
            warn!(size = stat.size, "remote file reports no content");
            return Err(TransferError::InvalidMetadata { size: stat.size });
        }
        self.read(file, stat.size, stat.crc)
    }

    /// Offers all of `source` to `file` and returns the byte count accepted.
    ///
    /// No checksum is computed: write integrity is only established by
    /// reading the committed file back.
    pub fn write<F: RemoteFile + ?Sized>(
        &self,
        file: &mut F,
        source: &[u8],
    ) -> Result<usize, TransferError> {
        let mut desc = TransferDescriptor::new(Direction::Write, source.len() as u64, self.chunk_size);
        let mut idle = 0u32;

        while !desc.is_complete() {
            let start = desc.bytes_moved() as usize;
            let left = desc.remaining();
            let want = desc.next_request();

            let n = match file.write(&source[start..start + want]) {
                Ok(n) => n,
                Err(e) => {
                    warn!(moved = desc.bytes_moved(), error = %e, "write primitive failed");
                    return Err(TransferError::WriteFailure {
                        moved: desc.bytes_moved(),
                        cause: e.into(),
                    });
                }
            };

            match self.policy {
                WritePolicy::Lenient if n as u64 >= left => {
                    desc.advance(left as usize);
                    self.notify(&desc);
                    break;
                }
                WritePolicy::Strict if n > want => {
                    return Err(TransferError::WriteFailure {
                        moved: desc.bytes_moved(),
                        cause: IoFault::Overrun {
                            requested: want,
                            reported: n,
                        },
                    });
                }
                _ => {}
            }

            if n == 0 {
                idle += 1;
                if idle >= MAX_IDLE_CALLS {
                    return Err(TransferError::WriteFailure {
                        moved: desc.bytes_moved(),
                        cause: IoFault::Stalled(idle),
                    });
                }
                continue;
            }
            idle = 0;

            desc.advance(n);
            self.notify(&desc);
        }

        debug!(size = desc.total_size(), "write accepted");
        Ok(desc.bytes_moved() as usize)
    }

    fn notify(&self, desc: &TransferDescriptor) {
        if let Some(cb) = &self.on_progress {
            cb(desc.progress());
        }
    }
}

/// Reads `total_size` bytes in `chunk_size` pieces and verifies them
/// against `expected_crc` with CRC-32.
pub fn transfer_read<F: RemoteFile + ?Sized>(
    file: &mut F,
    total_size: i64,
    expected_crc: u32,
    chunk_size: usize,
) -> Result<Vec<u8>, TransferError> {
    TransferEngine::try_new(chunk_size)?.read(file, total_size, expected_crc)
}

/// Like [`transfer_read`] into a caller-supplied buffer of the file's size.
pub fn transfer_read_into<F: RemoteFile + ?Sized>(
    file: &mut F,
    buf: &mut [u8],
    expected_crc: u32,
    chunk_size: usize,
) -> Result<usize, TransferError> {
    TransferEngine::try_new(chunk_size)?.read_into(file, buf, expected_crc)
}

/// Stats `file`, then reads and verifies all of it.
pub fn read_file<F: RemoteFile + ?Sized>(
    file: &mut F,
    chunk_size: usize,
) -> Result<Vec<u8>, TransferError> {
    TransferEngine::try_new(chunk_size)?.read_file(file)
}

/// Writes all of `source` in `chunk_size` pieces under [`WritePolicy::Strict`].
pub fn transfer_write<F: RemoteFile + ?Sized>(
    file: &mut F,
    source: &[u8],
    chunk_size: usize,
) -> Result<usize, TransferError> {
    TransferEngine::try_new(chunk_size)?.write(file, source)
}
