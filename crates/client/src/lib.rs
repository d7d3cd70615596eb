//! Contract for the TFS client library consumed by the transfer engine.
//!
//! The storage engine itself (name server, block placement, replication)
//! lives behind these traits. This crate only describes what an open
//! remote file and a connected session can do, and ships the pieces every
//! adapter shares: validated file names, the CRC-32 used for integrity
//! checks, a session pool keyed by name-server address, and a loopback
//! in-memory backend.

mod checksum;
mod error;
mod memory;
mod name;
mod pool;
mod remote;
mod types;

pub use checksum::{ChecksumAlgorithm, Crc32, checksum};
pub use error::ClientError;
pub use memory::{MemoryCluster, MemoryConnector, MemoryFile};
pub use name::{FILE_NAME_LEN, FileName};
pub use pool::SessionPool;
pub use remote::{Connector, RemoteFile, Session};
pub use types::{FileStat, OpenMode, UnlinkAction};
