//! # LOOK Elevator
//!
//! Per-device owner of a [`ScanQueue`]. The block layer drives it through
//! the usual elevator hooks: add a request, dispatch one to the driver, drop
//! a request that was merged into a neighbour, and ask for a request's
//! neighbours when deciding whether to merge.
//!
//! The pending sequence, arm position, direction and boundary live behind a
//! single lock, so a direction flip and the boundary re-settle that follows
//! it are never observed half-done by a concurrent insert.

use spin::Mutex;

use crate::config::LookConfig;
use crate::error::IoSchedResult;
use crate::queue::{Direction, QueueStats, ScanQueue};
use crate::request::{Request, RequestId, Sector};
use crate::snapshot::QueueSnapshot;

/// Name the elevator registers under
pub const ELEVATOR_NAME: &str = "look";

/// Receiver of dispatched requests
///
/// Ownership of every request passed to `submit` moves to the sink for good.
pub trait DispatchSink {
    /// Take a request for issue to the device
    fn submit(&mut self, request: Request);
}

impl DispatchSink for alloc::vec::Vec<Request> {
    fn submit(&mut self, request: Request) {
        self.push(request);
    }
}

impl DispatchSink for alloc::collections::VecDeque<Request> {
    fn submit(&mut self, request: Request) {
        self.push_back(request);
    }
}

/// LOOK elevator for one device
pub struct LookElevator {
    queue: Mutex<ScanQueue>,
}

impl LookElevator {
    /// Create an elevator for a device
    pub fn new(config: LookConfig) -> Self {
        log::debug!(
            "[LOOK] elevator up: head {} sweeping {}",
            config.initial_head,
            config.initial_direction.name()
        );
        Self {
            queue: Mutex::new(ScanQueue::with_config(config)),
        }
    }

    /// Queue a new request
    pub fn add_request(&self, request: Request) -> IoSchedResult<()> {
        self.queue.lock().insert(request)
    }

    /// Pop the next request in LOOK order
    pub fn dispatch(&self) -> Option<Request> {
        self.queue.lock().dispatch()
    }

    /// Move the next request to `sink`, returning whether one was moved
    pub fn dispatch_to<S: DispatchSink + ?Sized>(&self, sink: &mut S) -> bool {
        match self.dispatch() {
            Some(request) => {
                sink.submit(request);
                true
            },
            None => false,
        }
    }

    /// Move every pending request to `sink` in LOOK order
    ///
    /// The lock is held for the whole drain, so no insert interleaves.
    pub fn drain_to<S: DispatchSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut queue = self.queue.lock();
        let mut moved = 0;
        while let Some(request) = queue.dispatch() {
            sink.submit(request);
            moved += 1;
        }
        moved
    }

    /// `absorbed` was folded into `survivor` by the block layer
    ///
    /// Drops `absorbed` from the queue; returns whether it was pending.
    pub fn merged_requests(&self, survivor: RequestId, absorbed: RequestId) -> bool {
        if survivor == absorbed {
            log::warn!("[LOOK] refusing to merge {} into itself", survivor);
            return false;
        }
        let removed = self.queue.lock().remove(absorbed);
        if removed {
            log::trace!("[LOOK] MRG {} <- {}", survivor, absorbed);
        }
        removed
    }

    /// Resize a pending request after a back merge
    pub fn extend_request(&self, id: RequestId, length_in_sectors: u32) -> IoSchedResult<()> {
        self.queue.lock().extend(id, length_in_sectors)
    }

    /// Cancel a pending request
    pub fn remove_request(&self, id: RequestId) -> bool {
        self.queue.lock().remove(id)
    }

    /// Request immediately below `id` in sector order
    pub fn former_request(&self, id: RequestId) -> Option<Request> {
        self.queue.lock().peek_neighbors(id).0.cloned()
    }

    /// Request immediately above `id` in sector order
    pub fn latter_request(&self, id: RequestId) -> Option<Request> {
        self.queue.lock().peek_neighbors(id).1.cloned()
    }

    /// Whether no request is pending
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Arm position
    pub fn head_position(&self) -> Sector {
        self.queue.lock().head_position()
    }

    /// Sweep direction
    pub fn direction(&self) -> Direction {
        self.queue.lock().direction()
    }

    /// Queue counters
    pub fn stats(&self) -> QueueStats {
        self.queue.lock().stats()
    }

    /// Ordered listing for tracing
    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.lock().snapshot()
    }

    /// Run several queue operations under one lock acquisition
    pub fn with_queue<R>(&self, f: impl FnOnce(&mut ScanQueue) -> R) -> R {
        f(&mut self.queue.lock())
    }
}

impl Default for LookElevator {
    fn default() -> Self {
        Self::new(LookConfig::default())
    }
}

impl core::fmt::Debug for LookElevator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("LookElevator")
            .field("pending", &queue.len())
            .field("head_position", &queue.head_position())
            .field("direction", &queue.direction())
            .finish()
    }
}

impl Drop for LookElevator {
    fn drop(&mut self) {
        let pending = self.queue.get_mut().len();
        if pending != 0 {
            log::warn!(
                "[LOOK] elevator torn down with {} request(s) still queued",
                pending
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    fn elevator(head: Sector) -> LookElevator {
        LookElevator::new(LookConfig::new().with_head(head).quiet())
    }

    #[test]
    fn test_dispatch_to_sink() {
        let elv = elevator(20);
        for (id, start) in [(1, 50), (2, 10), (3, 80), (4, 30)] {
            elv.add_request(Request::read(id, start, 1)).unwrap();
        }

        let mut sink: Vec<Request> = Vec::new();
        while elv.dispatch_to(&mut sink) {}

        let order: Vec<Sector> = sink.iter().map(|rq| rq.start_sector).collect();
        assert_eq!(order, vec![30, 50, 80, 10]);
        assert!(elv.is_empty());
        assert!(!elv.dispatch_to(&mut sink));
    }

    #[test]
    fn test_drain_to_deque() {
        let elv = elevator(0);
        for id in 0..5u64 {
            elv.add_request(Request::write(id, 100 - id * 10, 1)).unwrap();
        }

        let mut sink = VecDeque::new();
        assert_eq!(elv.drain_to(&mut sink), 5);
        assert_eq!(sink.front().map(|rq| rq.start_sector), Some(60));
        assert_eq!(sink.back().map(|rq| rq.start_sector), Some(100));
        assert_eq!(elv.stats().dispatched, 5);
    }

    #[test]
    fn test_merged_requests() {
        let elv = elevator(0);
        elv.add_request(Request::read(1, 10, 4)).unwrap();
        elv.add_request(Request::read(2, 14, 4)).unwrap();

        assert!(elv.merged_requests(RequestId(1), RequestId(2)));
        elv.extend_request(RequestId(1), 8).unwrap();
        assert!(!elv.merged_requests(RequestId(1), RequestId(2)));
        assert!(!elv.merged_requests(RequestId(1), RequestId(1)));

        assert_eq!(elv.len(), 1);
        let rq = elv.dispatch().unwrap();
        assert_eq!(rq.end_sector(), 17);
        assert_eq!(elv.head_position(), 17);
    }

    #[test]
    fn test_former_and_latter() {
        let elv = elevator(0);
        for (id, start) in [(1, 10), (2, 20), (3, 30)] {
            elv.add_request(Request::read(id, start, 1)).unwrap();
        }

        assert_eq!(elv.former_request(RequestId(2)).map(|rq| rq.id), Some(RequestId(1)));
        assert_eq!(elv.latter_request(RequestId(2)).map(|rq| rq.id), Some(RequestId(3)));
        assert!(elv.former_request(RequestId(1)).is_none());
        assert!(elv.latter_request(RequestId(3)).is_none());
        assert!(elv.latter_request(RequestId(9)).is_none());
    }

    #[test]
    fn test_duplicate_through_elevator() {
        let elv = elevator(0);
        elv.add_request(Request::read(1, 10, 1)).unwrap();
        assert!(elv.add_request(Request::read(1, 10, 1)).is_err());
        assert!(elv.remove_request(RequestId(1)));
        assert!(elv.add_request(Request::read(1, 10, 1)).is_ok());
    }

    #[test]
    fn test_with_queue_is_atomic_unit() {
        let elv = elevator(0);
        let dispatched = elv.with_queue(|queue| {
            queue.insert(Request::read(1, 5, 1)).unwrap();
            queue.insert(Request::read(2, 3, 1)).unwrap();
            queue.dispatch()
        });
        assert_eq!(dispatched.map(|rq| rq.start_sector), Some(3));
        assert_eq!(elv.direction(), Direction::Forward);
        assert_eq!(elv.snapshot().starts(), vec![5]);
    }

    #[test]
    fn test_shared_between_threads() {
        let elv = Arc::new(elevator(0));
        let producers: Vec<_> = (0..4u64)
            .map(|t| {
                let elv = Arc::clone(&elv);
                std::thread::spawn(move || {
                    for i in 0..25u64 {
                        elv.add_request(Request::read(t * 100 + i, (i * 13 + t) % 64, 1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        let mut sink = Vec::new();
        assert_eq!(elv.drain_to(&mut sink), 100);
        let mut ids: Vec<u64> = sink.iter().map(|rq| rq.id.raw()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_name_and_debug() {
        assert_eq!(ELEVATOR_NAME, "look");
        let elv = LookElevator::default();
        let text = format!("{:?}", elv);
        assert!(text.contains("LookElevator"));
        assert!(text.contains("Forward"));
    }
}
