use std::fmt;

/// Access mode of an open remote file. Fixed for the handle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    Read,
    Write,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Read => f.write_str("read"),
            OpenMode::Write => f.write_str("write"),
        }
    }
}

/// Metadata reported by `stat` on a file opened for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes. Readers must reject anything `<= 0`.
    pub size: i64,
    /// CRC-32 recorded when the file was written.
    pub crc: u32,
}

/// Visibility changes accepted by `unlink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlinkAction {
    Delete,
    Undelete,
    Conceal,
    Reveal,
}
