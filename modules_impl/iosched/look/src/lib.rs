//! # Helix LOOK I/O Scheduler
//!
//! Elevator-style block request scheduler. Pending requests are kept in
//! sector order and released in the direction the arm is travelling; the
//! arm reverses only once nothing is left ahead of it, and never jumps back
//! to the far end while work remains (unlike C-LOOK).
//!
//! ## Components
//!
//! - **Scan Queue** ([`ScanQueue`]): sorted pending set, arm position, sweep
//!   direction and the ahead/behind boundary
//! - **Elevator** ([`LookElevator`]): per-device locked owner of a queue
//!   exposing the block-layer hooks
//! - **Snapshots** ([`QueueSnapshot`]): ordered listing for tracing
//!
//! ## Usage
//!
//! ```rust
//! use helix_iosched_look::{LookConfig, LookElevator, Request};
//!
//! let elevator = LookElevator::new(LookConfig::new().with_head(20));
//! for (id, sector) in [(1, 50), (2, 10), (3, 80), (4, 30)] {
//!     elevator.add_request(Request::read(id, sector, 1)).unwrap();
//! }
//!
//! let mut issued: Vec<Request> = Vec::new();
//! elevator.drain_to(&mut issued);
//!
//! let order: Vec<u64> = issued.iter().map(|rq| rq.start_sector).collect();
//! assert_eq!(order, [30, 50, 80, 10]);
//! ```
//!
//! ## Invariants
//!
//! 1. Pending requests are ordered by start sector; equal sectors keep
//!    insertion order.
//! 2. A request leaves the queue exactly once, by dispatch or by removal.
//! 3. The sweep direction only changes inside dispatch, and only when the
//!    current side has no request left.
//! 4. The boundary is re-derived after every dispatch.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod arena;
pub mod config;
pub mod elevator;
pub mod error;
pub mod queue;
pub mod request;
pub mod snapshot;

pub use config::{LookConfig, TraceFlags};
pub use elevator::{DispatchSink, LookElevator, ELEVATOR_NAME};
pub use error::{IoSchedError, IoSchedResult};
pub use queue::{Direction, QueueStats, ScanQueue};
pub use request::{Request, RequestId, RequestKind, Sector};
pub use snapshot::{QueueSnapshot, SnapshotEntry};

static_assertions::assert_impl_all!(LookElevator: Send, Sync);
static_assertions::assert_impl_all!(ScanQueue: Send);
static_assertions::assert_impl_all!(Request: Send, Sync, Clone);
