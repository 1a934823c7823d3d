//! # Queue Snapshots
//!
//! Point-in-time listing of a LOOK queue for tracing and debugging. Nothing
//! in the scheduler reads these back.

use alloc::vec::Vec;
use core::fmt;

use crate::queue::Direction;
use crate::request::{Request, RequestId, RequestKind, Sector};

/// One pending request as seen by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Request identity
    pub id: RequestId,
    /// First sector
    pub start_sector: Sector,
    /// Last sector
    pub end_sector: Sector,
    /// Read or write
    pub kind: RequestKind,
}

impl From<&Request> for SnapshotEntry {
    fn from(request: &Request) -> Self {
        Self {
            id: request.id,
            start_sector: request.start_sector,
            end_sector: request.end_sector(),
            kind: request.kind,
        }
    }
}

/// Ordered listing of a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Arm position
    pub head_position: Sector,
    /// Sweep direction
    pub direction: Direction,
    /// Index of the first ahead entry, `None` when nothing is ahead
    pub boundary: Option<usize>,
    /// Pending requests in ascending sector order
    pub entries: Vec<SnapshotEntry>,
}

impl QueueSnapshot {
    /// Entries the arm has already passed
    pub fn behind(&self) -> &[SnapshotEntry] {
        &self.entries[..self.split()]
    }

    /// Entries still ahead of the arm
    pub fn ahead(&self) -> &[SnapshotEntry] {
        &self.entries[self.split()..]
    }

    /// Start sectors in ascending order
    pub fn starts(&self) -> Vec<Sector> {
        self.entries.iter().map(|e| e.start_sector).collect()
    }

    /// Start sectors of the ahead side
    pub fn ahead_starts(&self) -> Vec<Sector> {
        self.ahead().iter().map(|e| e.start_sector).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue was empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn split(&self) -> usize {
        self.boundary.unwrap_or(self.entries.len())
    }
}

impl fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "QUEUE: head position: {} ({})",
            self.head_position,
            self.direction.name()
        )?;
        for (i, entry) in self.entries.iter().enumerate() {
            let marker = if Some(i) == self.boundary { '>' } else { ' ' };
            writeln!(
                f,
                "  {} {:>10} {} {}",
                marker,
                entry.start_sector,
                entry.kind.as_char(),
                entry.id
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LookConfig;
    use crate::queue::ScanQueue;

    fn sample() -> QueueSnapshot {
        let mut queue = ScanQueue::with_config(LookConfig::new().with_head(25).quiet());
        queue.insert(Request::read(1, 30, 4)).unwrap();
        queue.insert(Request::write(2, 10, 1)).unwrap();
        queue.insert(Request::read(3, 20, 2)).unwrap();
        queue.snapshot()
    }

    #[test]
    fn test_snapshot_split() {
        let snapshot = sample();
        assert_eq!(snapshot.starts(), vec![10, 20, 30]);
        assert_eq!(snapshot.boundary, Some(2));
        assert_eq!(snapshot.behind().len(), 2);
        assert_eq!(snapshot.ahead_starts(), vec![30]);
        assert_eq!(snapshot.ahead()[0].end_sector, 33);
    }

    #[test]
    fn test_snapshot_nothing_ahead() {
        let mut queue = ScanQueue::with_config(LookConfig::new().with_head(100).quiet());
        queue.insert(Request::read(1, 5, 1)).unwrap();
        let snapshot = queue.snapshot();
        assert_eq!(snapshot.boundary, None);
        assert!(snapshot.ahead().is_empty());
        assert_eq!(snapshot.behind().len(), 1);
    }

    #[test]
    fn test_snapshot_display() {
        let text = format!("{}", sample());
        assert!(text.starts_with("QUEUE: head position: 25 (forward)"));
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().any(|l| l.trim_start().starts_with("> ") && l.contains("30")));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = ScanQueue::new().snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.head_position, 0);
    }
}
