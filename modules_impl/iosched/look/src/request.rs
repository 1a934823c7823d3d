//! # Block Requests
//!
//! Descriptors for the pending reads and writes the elevator orders.
//! The elevator only looks at the extent; the payload stays with the host.

use core::fmt;

/// Sector address on the managed device
pub type Sector = u64;

/// Opaque request identity assigned by the request source
///
/// Two requests may cover the same sectors; they are told apart by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Create a request id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rq#{}", self.0)
    }
}

/// Data direction of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Read from the medium
    Read,
    /// Write to the medium
    Write,
}

impl RequestKind {
    /// Single-letter tag used in traces
    pub fn as_char(&self) -> char {
        match self {
            Self::Read => 'R',
            Self::Write => 'W',
        }
    }

    /// Get kind name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// A pending I/O request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Identity
    pub id: RequestId,
    /// First sector addressed
    pub start_sector: Sector,
    /// Extent in sectors
    pub length_in_sectors: u32,
    /// Read or write
    pub kind: RequestKind,
}

impl Request {
    /// Create a request
    pub fn new(id: RequestId, start_sector: Sector, length_in_sectors: u32, kind: RequestKind) -> Self {
        Self {
            id,
            start_sector,
            length_in_sectors,
            kind,
        }
    }

    /// Create a read request
    pub fn read(id: u64, start_sector: Sector, length_in_sectors: u32) -> Self {
        Self::new(RequestId(id), start_sector, length_in_sectors, RequestKind::Read)
    }

    /// Create a write request
    pub fn write(id: u64, start_sector: Sector, length_in_sectors: u32) -> Self {
        Self::new(RequestId(id), start_sector, length_in_sectors, RequestKind::Write)
    }

    /// Last sector covered, or `None` for an empty or overflowing extent
    pub fn checked_end_sector(&self) -> Option<Sector> {
        let length = u64::from(self.length_in_sectors);
        if length == 0 {
            return None;
        }
        self.start_sector.checked_add(length - 1)
    }

    /// Last sector covered
    ///
    /// Only meaningful for requests that passed [`Request::checked_end_sector`];
    /// the queue rejects every other request at insertion.
    pub fn end_sector(&self) -> Sector {
        self.checked_end_sector().unwrap_or(self.start_sector)
    }

    /// Whether the extent is non-empty and addressable
    pub fn has_valid_extent(&self) -> bool {
        self.checked_end_sector().is_some()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}+{}",
            self.id,
            self.kind.as_char(),
            self.start_sector,
            self.length_in_sectors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_sector() {
        let rq = Request::read(1, 100, 8);
        assert_eq!(rq.checked_end_sector(), Some(107));
        assert_eq!(rq.end_sector(), 107);

        let single = Request::write(2, 5, 1);
        assert_eq!(single.end_sector(), 5);
    }

    #[test]
    fn test_invalid_extents() {
        assert!(!Request::read(1, 10, 0).has_valid_extent());
        assert!(!Request::read(2, u64::MAX, 2).has_valid_extent());
        assert!(Request::read(3, u64::MAX, 1).has_valid_extent());
    }

    #[test]
    fn test_display() {
        let rq = Request::write(7, 40, 2);
        assert_eq!(format!("{}", rq), "rq#7 W 40+2");
        assert_eq!(RequestKind::Read.as_char(), 'R');
    }
}
