use crate::Direction;

/// Callback invoked after every chunk that moved bytes.
pub type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Snapshot of a transfer in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub direction: Direction,
    pub bytes_moved: u64,
    pub total_size: u64,
}

impl Progress {
    /// Completed fraction in `[0.0, 1.0]`. An empty transfer is complete.
    pub fn fraction(&self) -> f64 {
        if self.total_size == 0 {
            return 1.0;
        }
        self.bytes_moved as f64 / self.total_size as f64
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_moved == self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_partial_transfer() {
        let p = Progress {
            direction: Direction::Read,
            bytes_moved: 25,
            total_size: 100,
        };
        assert_eq!(p.fraction(), 0.25);
        assert!(!p.is_complete());
    }

    #[test]
    fn empty_transfer_is_complete() {
        let p = Progress {
            direction: Direction::Write,
            bytes_moved: 0,
            total_size: 0,
        };
        assert_eq!(p.fraction(), 1.0);
        assert!(p.is_complete());
    }
}
