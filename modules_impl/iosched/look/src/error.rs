//! Error types for the LOOK elevator.

use core::fmt;

use crate::request::{RequestId, Sector};

/// Result type for elevator operations
pub type IoSchedResult<T> = Result<T, IoSchedError>;

/// Elevator error types
///
/// Absence of a request on remove or lookup is reported through `bool` /
/// `Option` results; `NotFound` only surfaces from operations that already
/// return a `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoSchedError {
    /// A request with this id is already pending
    DuplicateRequest(RequestId),
    /// Zero-length extent, or one whose end sector does not fit in a `Sector`
    InvalidExtent {
        /// First sector of the rejected extent
        start: Sector,
        /// Length of the rejected extent
        length: u32,
    },
    /// No pending request has this id
    NotFound(RequestId),
}

impl fmt::Display for IoSchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRequest(id) => write!(f, "Request {} is already queued", id),
            Self::InvalidExtent { start, length } => {
                write!(f, "Invalid extent: {} sectors at {}", length, start)
            },
            Self::NotFound(id) => write!(f, "Request {} is not queued", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = IoSchedError::DuplicateRequest(RequestId(3));
        assert_eq!(format!("{}", error), "Request rq#3 is already queued");

        let error = IoSchedError::InvalidExtent {
            start: 12,
            length: 0,
        };
        assert!(format!("{}", error).contains("0 sectors at 12"));
    }
}
