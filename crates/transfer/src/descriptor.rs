use std::fmt;

use tfsgate_client::ChecksumAlgorithm;

use crate::Progress;

/// Direction of a transfer relative to the remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// Counters for one transfer in flight.
///
/// Created right before the chunk loop and dropped right after; it owns
/// no resources. `bytes_moved` only advances by counts the primitive
/// actually reported and never passes `total_size`.
#[derive(Debug, Clone)]
pub struct TransferDescriptor {
    direction: Direction,
    total_size: u64,
    chunk_size: usize,
    bytes_moved: u64,
    running_checksum: u32,
}

impl TransferDescriptor {
    pub fn new(direction: Direction, total_size: u64, chunk_size: usize) -> Self {
        Self {
            direction,
            total_size,
            chunk_size,
            bytes_moved: 0,
            running_checksum: 0,
        }
    }

    /// Size of the next primitive call: `min(remaining, chunk_size)`.
    pub fn next_request(&self) -> usize {
        let remaining = self.remaining();
        if remaining < self.chunk_size as u64 {
            remaining as usize
        } else {
            self.chunk_size
        }
    }

    /// Records `n` bytes as moved.
    ///
    /// Callers must not pass more than [`remaining`](Self::remaining).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n as u64 <= self.remaining(), "advance past total size");
        self.bytes_moved = (self.bytes_moved + n as u64).min(self.total_size);
    }

    /// Folds freshly read bytes into the running checksum.
    pub fn fold<C: ChecksumAlgorithm + ?Sized>(&mut self, checksum: &C, data: &[u8]) {
        self.running_checksum = checksum.fold(self.running_checksum, data);
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn bytes_moved(&self) -> u64 {
        self.bytes_moved
    }

    pub fn remaining(&self) -> u64 {
        self.total_size - self.bytes_moved
    }

    pub fn running_checksum(&self) -> u32 {
        self.running_checksum
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_moved == self.total_size
    }

    pub fn progress(&self) -> Progress {
        Progress {
            direction: self.direction,
            bytes_moved: self.bytes_moved,
            total_size: self.total_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfsgate_client::{Crc32, checksum};

    #[test]
    fn requests_follow_remaining_bytes() {
        let mut d = TransferDescriptor::new(Direction::Read, 10, 4);
        assert_eq!(d.next_request(), 4);
        d.advance(4);
        assert_eq!(d.next_request(), 4);
        d.advance(4);
        assert_eq!(d.next_request(), 2);
        d.advance(2);
        assert!(d.is_complete());
        assert_eq!(d.next_request(), 0);
    }

    #[test]
    fn short_advance_keeps_position() {
        let mut d = TransferDescriptor::new(Direction::Write, 10, 8);
        d.advance(3);
        assert_eq!(d.bytes_moved(), 3);
        assert_eq!(d.remaining(), 7);
        assert_eq!(d.next_request(), 7);
    }

    #[test]
    fn chunk_larger_than_total() {
        let d = TransferDescriptor::new(Direction::Read, 5, 1000);
        assert_eq!(d.next_request(), 5);
    }

    #[test]
    fn fold_tracks_checksum() {
        let mut d = TransferDescriptor::new(Direction::Read, 6, 3);
        d.fold(&Crc32, b"abc");
        d.fold(&Crc32, b"def");
        assert_eq!(d.running_checksum(), checksum(b"abcdef"));
    }

    #[test]
    fn progress_snapshot() {
        let mut d = TransferDescriptor::new(Direction::Write, 8, 4);
        d.advance(4);
        let p = d.progress();
        assert_eq!(p.direction, Direction::Write);
        assert_eq!(p.bytes_moved, 4);
        assert_eq!(p.total_size, 8);
    }
}
