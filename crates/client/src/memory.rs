//! Loopback in-memory backend.
//!
//! Implements [`Session`] without a name server: committed files live in a
//! shared map for as long as the cluster value does. Used by tests and by
//! the gateway binary when no real cluster is wired in.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::debug;

use crate::checksum::checksum;
use crate::{ClientError, Connector, FileName, FileStat, OpenMode, RemoteFile, Session, UnlinkAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Visible,
    Deleted,
    Concealed,
}

struct StoredFile {
    data: Arc<Vec<u8>>,
    crc: u32,
    suffix: Option<String>,
    visibility: Visibility,
}

#[derive(Default)]
struct ClusterInner {
    files: HashMap<FileName, StoredFile>,
    next_seq: u32,
    read_only: bool,
    open_handles: usize,
}

/// An in-memory cluster. Clones share the same files.
#[derive(Clone)]
pub struct MemoryCluster {
    inner: Arc<Mutex<ClusterInner>>,
    cluster_id: u8,
    max_io: usize,
}

impl MemoryCluster {
    /// Creates an empty cluster. `cluster_id` (0-9) appears in file names.
    pub fn new(cluster_id: u8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClusterInner::default())),
            cluster_id: cluster_id % 10,
            max_io: 0,
        }
    }

    /// Caps every read and write call at `max_io` bytes (0 = no cap),
    /// emulating a transport that moves data in short transfers.
    pub fn with_max_io(mut self, max_io: usize) -> Self {
        self.max_io = max_io;
        self
    }

    /// While read-only, committing a written file fails.
    pub fn set_read_only(&self, read_only: bool) {
        self.lock().read_only = read_only;
    }

    /// Number of committed files, including hidden ones.
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Number of handles opened and not yet closed or aborted.
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    fn lock(&self) -> MutexGuard<'_, ClusterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Session for MemoryCluster {
    type File = MemoryFile;

    fn open(
        &self,
        name: Option<&FileName>,
        suffix: Option<&str>,
        mode: OpenMode,
    ) -> Result<MemoryFile, ClientError> {
        let state = match (mode, name) {
            (OpenMode::Write, None) => HandleState::Writing {
                suffix: suffix.map(str::to_owned),
                buf: Vec::new(),
            },
            (OpenMode::Write, Some(_)) => {
                return Err(ClientError::Rejected(
                    "rewriting an existing file is not supported".into(),
                ));
            }
            (OpenMode::Read, None) => {
                return Err(ClientError::InvalidName(
                    "a name is required to open for reading".into(),
                ));
            }
            (OpenMode::Read, Some(name)) => {
                let inner = self.lock();
                let stored = inner
                    .files
                    .get(name)
                    .filter(|f| f.visibility == Visibility::Visible)
                    .filter(|f| suffix.is_none() || f.suffix.as_deref() == suffix)
                    .ok_or_else(|| ClientError::NotFound(name.clone()))?;
                HandleState::Reading {
                    name: name.clone(),
                    data: Arc::clone(&stored.data),
                    crc: stored.crc,
                    pos: 0,
                }
            }
        };

        self.lock().open_handles += 1;
        Ok(MemoryFile {
            cluster: self.clone(),
            mode,
            state,
        })
    }

    fn unlink(
        &self,
        name: &FileName,
        _suffix: Option<&str>,
        action: UnlinkAction,
    ) -> Result<i64, ClientError> {
        let mut inner = self.lock();
        let stored = inner
            .files
            .get_mut(name)
            .ok_or_else(|| ClientError::NotFound(name.clone()))?;

        let next = match (action, stored.visibility) {
            (UnlinkAction::Delete, Visibility::Visible | Visibility::Concealed) => {
                Visibility::Deleted
            }
            (UnlinkAction::Undelete, Visibility::Deleted) => Visibility::Visible,
            (UnlinkAction::Conceal, Visibility::Visible) => Visibility::Concealed,
            (UnlinkAction::Reveal, Visibility::Concealed) => Visibility::Visible,
            (action, current) => {
                return Err(ClientError::Rejected(format!(
                    "{action:?} not applicable to a {current:?} file"
                )));
            }
        };

        stored.visibility = next;
        debug!(%name, ?action, "unlink applied");
        Ok(stored.data.len() as i64)
    }
}

enum HandleState {
    Reading {
        name: FileName,
        data: Arc<Vec<u8>>,
        crc: u32,
        pos: usize,
    },
    Writing {
        suffix: Option<String>,
        buf: Vec<u8>,
    },
    Closed,
}

/// A file opened on a [`MemoryCluster`].
pub struct MemoryFile {
    cluster: MemoryCluster,
    mode: OpenMode,
    state: HandleState,
}

impl MemoryFile {
    /// Marks the handle closed and returns the state it held.
    fn release(&mut self) -> Result<HandleState, ClientError> {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Closed => Err(ClientError::Closed),
            state => {
                let mut inner = self.cluster.lock();
                inner.open_handles = inner.open_handles.saturating_sub(1);
                Ok(state)
            }
        }
    }

    fn cap(&self, len: usize) -> usize {
        match self.cluster.max_io {
            0 => len,
            max => len.min(max),
        }
    }

    fn commit(&self, suffix: Option<String>, data: Vec<u8>) -> Result<FileName, ClientError> {
        let mut inner = self.cluster.lock();
        if inner.read_only {
            return Err(ClientError::Rejected("cluster is read-only".into()));
        }

        let crc = checksum(&data);
        let seq = inner.next_seq;
        inner.next_seq = inner.next_seq.wrapping_add(1);

        // Block id and a file id derived from the sequence and content CRC.
        let mut raw = [0u8; 12];
        raw[..4].copy_from_slice(&seq.to_be_bytes());
        raw[4..8].copy_from_slice(&seq.to_be_bytes());
        raw[8..].copy_from_slice(&crc.to_be_bytes());
        let encoded = format!(
            "T{}{}",
            char::from(b'0' + self.cluster.cluster_id),
            URL_SAFE_NO_PAD.encode(raw)
        );
        let name = FileName::parse(&encoded)?;

        debug!(%name, size = data.len(), crc, "file committed");
        inner.files.insert(
            name.clone(),
            StoredFile {
                data: Arc::new(data),
                crc,
                suffix,
                visibility: Visibility::Visible,
            },
        );
        Ok(name)
    }
}

impl RemoteFile for MemoryFile {
    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn stat(&mut self) -> Result<FileStat, ClientError> {
        match &self.state {
            HandleState::Reading { data, crc, .. } => Ok(FileStat {
                size: data.len() as i64,
                crc: *crc,
            }),
            HandleState::Writing { .. } => Err(ClientError::WrongMode),
            HandleState::Closed => Err(ClientError::Closed),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        let want = self.cap(buf.len());
        match &mut self.state {
            HandleState::Reading { data, pos, .. } => {
                let n = want.min(data.len() - *pos);
                buf[..n].copy_from_slice(&data[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            }
            HandleState::Writing { .. } => Err(ClientError::WrongMode),
            HandleState::Closed => Err(ClientError::Closed),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, ClientError> {
        let n = self.cap(buf.len());
        match &mut self.state {
            HandleState::Writing { buf: pending, .. } => {
                pending.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            HandleState::Reading { .. } => Err(ClientError::WrongMode),
            HandleState::Closed => Err(ClientError::Closed),
        }
    }

    fn close(&mut self) -> Result<FileName, ClientError> {
        match self.release()? {
            HandleState::Reading { name, .. } => Ok(name),
            HandleState::Writing { suffix, buf } => self.commit(suffix, buf),
            HandleState::Closed => Err(ClientError::Closed),
        }
    }

    fn abort(&mut self) -> Result<(), ClientError> {
        if let HandleState::Writing { buf, .. } = self.release()? {
            debug!(size = buf.len(), "pending write discarded");
        }
        Ok(())
    }
}

/// Hands out one [`MemoryCluster`] per name-server address.
#[derive(Default)]
pub struct MemoryConnector {
    clusters: Mutex<HashMap<String, MemoryCluster>>,
    max_io: usize,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies [`MemoryCluster::with_max_io`] to every cluster created.
    pub fn with_max_io(mut self, max_io: usize) -> Self {
        self.max_io = max_io;
        self
    }
}

impl Connector for MemoryConnector {
    type Session = MemoryCluster;

    fn connect(&self, addr: &str) -> Result<MemoryCluster, ClientError> {
        addr.parse::<SocketAddr>().map_err(|e| ClientError::Connect {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;

        let mut clusters = self.clusters.lock().unwrap_or_else(PoisonError::into_inner);
        let cluster = clusters
            .entry(addr.to_owned())
            .or_insert_with(|| MemoryCluster::new(1).with_max_io(self.max_io));
        Ok(cluster.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(cluster: &MemoryCluster, data: &[u8], suffix: Option<&str>) -> FileName {
        let mut file = cluster.open(None, suffix, OpenMode::Write).unwrap();
        assert_eq!(file.write(data).unwrap(), data.len());
        file.close().unwrap()
    }

    #[test]
    fn write_then_read_back() {
        let cluster = MemoryCluster::default();
        let name = write_file(&cluster, b"hello tfs", None);
        assert_eq!(name.as_str().len(), crate::FILE_NAME_LEN);
        assert!(name.as_str().starts_with("T1"));

        let mut file = cluster.open(Some(&name), None, OpenMode::Read).unwrap();
        let stat = file.stat().unwrap();
        assert_eq!(stat.size, 9);
        assert_eq!(stat.crc, checksum(b"hello tfs"));

        let mut buf = [0u8; 32];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello tfs");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.close().unwrap(), name);
    }

    #[test]
    fn names_are_unique() {
        let cluster = MemoryCluster::default();
        let a = write_file(&cluster, b"same", None);
        let b = write_file(&cluster, b"same", None);
        assert_ne!(a, b);
        assert_eq!(cluster.file_count(), 2);
    }

    #[test]
    fn max_io_shortens_calls() {
        let cluster = MemoryCluster::default().with_max_io(3);
        let mut file = cluster.open(None, None, OpenMode::Write).unwrap();
        assert_eq!(file.write(b"abcdefg").unwrap(), 3);
        assert_eq!(file.write(b"defg").unwrap(), 3);
        assert_eq!(file.write(b"g").unwrap(), 1);
        let name = file.close().unwrap();

        let mut file = cluster.open(Some(&name), None, OpenMode::Read).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn mode_is_enforced() {
        let cluster = MemoryCluster::default();
        let name = write_file(&cluster, b"data", None);

        let mut reader = cluster.open(Some(&name), None, OpenMode::Read).unwrap();
        assert_eq!(reader.mode(), OpenMode::Read);
        assert!(matches!(reader.write(b"x"), Err(ClientError::WrongMode)));

        let mut writer = cluster.open(None, None, OpenMode::Write).unwrap();
        assert!(matches!(writer.stat(), Err(ClientError::WrongMode)));
        assert!(matches!(writer.read(&mut [0u8; 4]), Err(ClientError::WrongMode)));
    }

    #[test]
    fn closed_handle_rejects_calls() {
        let cluster = MemoryCluster::default();
        let mut writer = cluster.open(None, None, OpenMode::Write).unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.write(b"x"), Err(ClientError::Closed)));
        assert!(matches!(writer.close(), Err(ClientError::Closed)));
    }

    #[test]
    fn read_requires_name() {
        let cluster = MemoryCluster::default();
        let err = cluster.open(None, None, OpenMode::Read).err().unwrap();
        assert!(matches!(err, ClientError::InvalidName(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let cluster = MemoryCluster::default();
        let name = FileName::parse("T1AAAAAQAAAAAAAAAB").unwrap();
        let err = cluster.open(Some(&name), None, OpenMode::Read).err().unwrap();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn suffix_must_match() {
        let cluster = MemoryCluster::default();
        let name = write_file(&cluster, b"img", Some(".jpg"));

        assert!(cluster.open(Some(&name), Some(".jpg"), OpenMode::Read).is_ok());
        assert!(cluster.open(Some(&name), None, OpenMode::Read).is_ok());
        assert!(cluster.open(Some(&name), Some(".png"), OpenMode::Read).is_err());
    }

    #[test]
    fn unlink_transitions() {
        let cluster = MemoryCluster::default();
        let name = write_file(&cluster, b"12345", None);

        assert_eq!(cluster.unlink(&name, None, UnlinkAction::Conceal).unwrap(), 5);
        assert!(cluster.open(Some(&name), None, OpenMode::Read).is_err());
        assert!(cluster.unlink(&name, None, UnlinkAction::Undelete).is_err());

        cluster.unlink(&name, None, UnlinkAction::Reveal).unwrap();
        assert!(cluster.open(Some(&name), None, OpenMode::Read).is_ok());

        cluster.unlink(&name, None, UnlinkAction::Delete).unwrap();
        assert!(cluster.open(Some(&name), None, OpenMode::Read).is_err());

        cluster.unlink(&name, None, UnlinkAction::Undelete).unwrap();
        assert!(cluster.open(Some(&name), None, OpenMode::Read).is_ok());
    }

    #[test]
    fn abort_discards_pending_write() {
        let cluster = MemoryCluster::default();
        let mut writer = cluster.open(None, None, OpenMode::Write).unwrap();
        writer.write(b"half a file").unwrap();

        writer.abort().unwrap();
        assert_eq!(cluster.file_count(), 0);
        assert!(matches!(writer.abort(), Err(ClientError::Closed)));
        assert!(matches!(writer.close(), Err(ClientError::Closed)));
    }

    #[test]
    fn open_handles_track_close_and_abort() {
        let cluster = MemoryCluster::default();
        let name = write_file(&cluster, b"counted", None);
        assert_eq!(cluster.open_handles(), 0);

        let mut a = cluster.open(Some(&name), None, OpenMode::Read).unwrap();
        let mut b = cluster.open(None, None, OpenMode::Write).unwrap();
        assert_eq!(cluster.open_handles(), 2);

        a.abort().unwrap();
        assert_eq!(cluster.open_handles(), 1);

        cluster.set_read_only(true);
        assert!(b.write(b"x").is_ok());
        assert!(b.close().is_err());
        assert_eq!(cluster.open_handles(), 0);
    }

    #[test]
    fn read_only_cluster_rejects_commit() {
        let cluster = MemoryCluster::default();
        cluster.set_read_only(true);
        let mut writer = cluster.open(None, None, OpenMode::Write).unwrap();
        writer.write(b"data").unwrap();
        assert!(matches!(writer.close(), Err(ClientError::Rejected(_))));
        assert_eq!(cluster.file_count(), 0);
    }

    #[test]
    fn connector_shares_cluster_per_address() {
        let connector = MemoryConnector::new();
        let a = connector.connect("127.0.0.1:8108").unwrap();
        let name = write_file(&a, b"shared", None);

        let b = connector.connect("127.0.0.1:8108").unwrap();
        assert!(b.open(Some(&name), None, OpenMode::Read).is_ok());

        let other = connector.connect("127.0.0.1:9999").unwrap();
        assert!(other.open(Some(&name), None, OpenMode::Read).is_err());
    }

    #[test]
    fn connector_rejects_bad_address() {
        let connector = MemoryConnector::new();
        let err = connector.connect("nameserver").err().unwrap();
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
