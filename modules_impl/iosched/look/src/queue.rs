//! # LOOK Scan Queue
//!
//! Pending requests kept in ascending start-sector order, together with the
//! arm position, the sweep direction and a boundary that splits the sequence
//! into the part the arm has already passed and the part still ahead of it.
//!
//! ```text
//!            behind                 boundary          ahead
//!   ┌────┬────┬────┬────┐             │   ┌────┬────┬────┐
//!   │ 10 │ 12 │ 25 │ 31 │─────────────┼──▶│ 40 │ 52 │ 90 │
//!   └────┴────┴────┴────┘             │   └────┴────┴────┘
//!                        head_position = 35
//!
//!   Forward: 40, 52, 90, then reverse: 31, 25, 12, 10
//! ```
//!
//! Viewed from the boundary the list is a ring: the sweep front is the first
//! ahead request, the sweep back is the last behind request. Dispatch takes
//! the front while moving forward and the back while moving in reverse, and
//! reverses only when the side it is sweeping has run dry.
//!
//! A request sitting exactly at the arm belongs to the side the current
//! sweep visits next, so it is served before the arm moves on.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::arena::{RequestArena, SlotId};
use crate::config::{LookConfig, TraceFlags};
use crate::error::{IoSchedError, IoSchedResult};
use crate::request::{Request, RequestId, Sector};
use crate::snapshot::{QueueSnapshot, SnapshotEntry};

/// Sweep direction of the arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward increasing sectors
    Forward,
    /// Toward decreasing sectors
    Reverse,
}

impl Direction {
    /// The other direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Get direction name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

/// Which half of the sequence a start sector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Not yet reached by the arm in the current sweep
    Ahead,
    /// Already passed by the arm in the current sweep
    Behind,
}

impl Side {
    /// Step one node further from the boundary
    fn away_from_boundary(self, arena: &RequestArena, slot: SlotId) -> Option<SlotId> {
        match self {
            Self::Ahead => arena.next(slot),
            Self::Behind => arena.prev(slot),
        }
    }

    /// Whether a new request at `start` goes on the boundary side of `existing`
    fn stops_before(self, existing: Sector, start: Sector) -> bool {
        match self {
            Self::Ahead => existing > start,
            Self::Behind => existing <= start,
        }
    }

    /// Link `request` next to the node where the scan stopped
    ///
    /// A scan that runs off its side stops at `None`: the end of the list for
    /// the ahead side, the front of the list for the behind side.
    fn splice(self, arena: &mut RequestArena, stop: Option<SlotId>, request: Request) -> SlotId {
        match self {
            Self::Ahead => arena.insert_before(stop, request),
            Self::Behind => arena.insert_after(stop, request),
        }
    }
}

/// Queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Requests accepted by insert
    pub inserted: u64,
    /// Requests released by dispatch
    pub dispatched: u64,
    /// Requests dropped by remove
    pub removed: u64,
    /// Requests refused by insert
    pub rejected: u64,
    /// Sweep reversals
    pub flips: u64,
}

/// Sector-ordered LOOK scheduling queue for one device
///
/// Not internally synchronized; see [`crate::LookElevator`] for the locked
/// per-device wrapper.
#[derive(Debug)]
pub struct ScanQueue {
    /// Pending requests in ascending start-sector order
    pending: RequestArena,
    /// Identity lookup
    index: HashMap<RequestId, SlotId>,
    /// First request ahead of the arm, `None` when nothing is ahead
    boundary: Option<SlotId>,
    /// End sector of the last dispatched request
    head_position: Sector,
    /// Current sweep direction
    direction: Direction,
    /// Configuration
    config: LookConfig,
    /// Counters
    stats: QueueStats,
}

impl Default for ScanQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanQueue {
    /// Create a queue with the default configuration
    pub fn new() -> Self {
        Self::with_config(LookConfig::default())
    }

    /// Create a queue from a configuration
    pub fn with_config(config: LookConfig) -> Self {
        Self {
            pending: RequestArena::with_capacity(config.capacity),
            index: HashMap::with_capacity(config.capacity),
            boundary: None,
            head_position: config.initial_head,
            direction: config.initial_direction,
            config,
            stats: QueueStats::default(),
        }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Queue a request in sector order
    ///
    /// Never changes the sweep direction or the arm position.
    pub fn insert(&mut self, request: Request) -> IoSchedResult<()> {
        if !request.has_valid_extent() {
            self.stats.rejected += 1;
            log::warn!(
                "[LOOK] rejecting {}: empty or overflowing extent",
                request
            );
            return Err(IoSchedError::InvalidExtent {
                start: request.start_sector,
                length: request.length_in_sectors,
            });
        }
        if self.index.contains_key(&request.id) {
            self.stats.rejected += 1;
            log::warn!("[LOOK] rejecting {}: already queued", request.id);
            return Err(IoSchedError::DuplicateRequest(request.id));
        }

        let id = request.id;
        let start = request.start_sector;
        let side = self.side_of(start);

        let slot = match self.pending.len() {
            0 => self.insert_sole(request, side),
            1 => self.insert_beside_single(request, side),
            _ => self.insert_ordered(request, side),
        };
        self.index.insert(id, slot);
        self.stats.inserted += 1;

        if self.traces(TraceFlags::INSERT) {
            log::trace!(
                "[LOOK] ADD {} {:?} of head {}",
                self.pending.get(slot),
                side,
                self.head_position
            );
        }
        self.after_mutation();
        Ok(())
    }

    fn insert_sole(&mut self, request: Request, side: Side) -> SlotId {
        let slot = self.pending.insert_before(None, request);
        self.boundary = match side {
            Side::Ahead => Some(slot),
            Side::Behind => None,
        };
        slot
    }

    /// One request pending: there is no neighbour pair to bracket against,
    /// so place by comparing with the lone element and fix up the boundary.
    fn insert_beside_single(&mut self, request: Request, side: Side) -> SlotId {
        let Some(existing) = self.pending.first() else {
            return self.insert_sole(request, side);
        };

        let slot = if self.pending.get(existing).start_sector <= request.start_sector {
            self.pending.insert_after(Some(existing), request)
        } else {
            self.pending.insert_before(Some(existing), request)
        };
        self.adopt_boundary(slot, side);
        slot
    }

    /// Scan the request's side outward from the boundary and splice it in
    /// after any equal start sectors.
    ///
    /// The ahead side is a contiguous run ending at the back of the list, so
    /// an ahead scan that finds no larger start sector has reached the seam
    /// where the sweep turns and the request is appended there. The behind
    /// side mirrors this toward the front of the list.
    fn insert_ordered(&mut self, request: Request, side: Side) -> SlotId {
        let start = request.start_sector;
        let mut cursor = match side {
            Side::Ahead => self.boundary,
            Side::Behind => self.behind_top(),
        };

        while let Some(at) = cursor {
            if side.stops_before(self.pending.get(at).start_sector, start) {
                break;
            }
            cursor = side.away_from_boundary(&self.pending, at);
        }

        let slot = side.splice(&mut self.pending, cursor, request);
        self.adopt_boundary(slot, side);
        slot
    }

    /// A new ahead request linked in front of the current boundary becomes it
    fn adopt_boundary(&mut self, slot: SlotId, side: Side) {
        if side == Side::Ahead && self.pending.next(slot) == self.boundary {
            self.boundary = Some(slot);
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Release the next request in LOOK order
    ///
    /// Returns `None` without touching any state when the queue is empty.
    pub fn dispatch(&mut self) -> Option<Request> {
        let front = self.sweep_front()?;
        let back = self.sweep_back()?;

        let slot = match self.direction {
            Direction::Forward => {
                if self.pending.get(front).start_sector < self.head_position {
                    self.flip();
                    back
                } else {
                    front
                }
            },
            Direction::Reverse => {
                if self.pending.get(back).start_sector > self.head_position {
                    self.flip();
                    front
                } else {
                    back
                }
            },
        };

        let successor = self.pending.next(slot);
        if self.boundary == Some(slot) {
            self.boundary = successor;
        }
        let request = self.pending.remove(slot);
        self.index.remove(&request.id);
        self.head_position = request.end_sector();
        self.settle_boundary(successor);
        self.stats.dispatched += 1;

        if self.traces(TraceFlags::DISPATCH) {
            log::trace!(
                "[LOOK] DSP {} {} head now {}",
                request,
                self.direction.name(),
                self.head_position
            );
        }
        self.after_mutation();
        Some(request)
    }

    fn flip(&mut self) {
        let direction = self.direction.reversed();
        if self.traces(TraceFlags::FLIP) {
            log::debug!(
                "[LOOK] sweep exhausted at {}, turning {}",
                self.head_position,
                direction.name()
            );
        }
        self.direction = direction;
        self.stats.flips += 1;
    }

    /// First request ahead of the arm, wrapping to the lowest request
    fn sweep_front(&self) -> Option<SlotId> {
        self.boundary.or_else(|| self.pending.first())
    }

    /// Last request behind the arm, wrapping to the highest request
    fn sweep_back(&self) -> Option<SlotId> {
        self.behind_top().or_else(|| self.pending.last())
    }

    fn behind_top(&self) -> Option<SlotId> {
        match self.boundary {
            Some(at) => self.pending.prev(at),
            None => self.pending.last(),
        }
    }

    /// Re-derive the boundary after the arm moved, starting the search at
    /// `anchor` (the dispatched request's old successor, `None` for the end)
    fn settle_boundary(&mut self, anchor: Option<SlotId>) {
        let mut split = anchor;

        loop {
            let prev = match split {
                Some(at) => self.pending.prev(at),
                None => self.pending.last(),
            };
            match prev {
                Some(p) if self.side_of(self.pending.get(p).start_sector) == Side::Ahead => {
                    split = Some(p);
                },
                _ => break,
            }
        }

        while let Some(at) = split {
            if self.side_of(self.pending.get(at).start_sector) == Side::Ahead {
                break;
            }
            split = self.pending.next(at);
        }

        self.boundary = split;
    }

    fn side_of(&self, start: Sector) -> Side {
        let ahead = match self.direction {
            Direction::Forward => start >= self.head_position,
            Direction::Reverse => start > self.head_position,
        };
        if ahead {
            Side::Ahead
        } else {
            Side::Behind
        }
    }

    // =========================================================================
    // Remove / lookup
    // =========================================================================

    /// Drop a pending request, returning whether it was queued
    pub fn remove(&mut self, id: RequestId) -> bool {
        self.take(id).is_some()
    }

    /// Drop a pending request and hand it back
    pub fn take(&mut self, id: RequestId) -> Option<Request> {
        let slot = self.index.remove(&id)?;
        if self.boundary == Some(slot) {
            self.boundary = self.pending.next(slot);
        }
        let request = self.pending.remove(slot);
        self.stats.removed += 1;

        if self.traces(TraceFlags::REMOVE) {
            log::trace!("[LOOK] DEL {}", request);
        }
        self.after_mutation();
        Some(request)
    }

    /// Grow or shrink a pending request in place after a back merge
    ///
    /// The start sector is unchanged, so ordering is unaffected.
    pub fn extend(&mut self, id: RequestId, length_in_sectors: u32) -> IoSchedResult<()> {
        let slot = *self.index.get(&id).ok_or(IoSchedError::NotFound(id))?;
        let request = self.pending.get_mut(slot);
        let resized = Request {
            length_in_sectors,
            ..request.clone()
        };
        if !resized.has_valid_extent() {
            return Err(IoSchedError::InvalidExtent {
                start: resized.start_sector,
                length: length_in_sectors,
            });
        }
        request.length_in_sectors = length_in_sectors;
        Ok(())
    }

    /// Predecessor and successor of a pending request in sector order
    pub fn peek_neighbors(&self, id: RequestId) -> (Option<&Request>, Option<&Request>) {
        match self.index.get(&id) {
            Some(&slot) => (
                self.pending.prev(slot).map(|p| self.pending.get(p)),
                self.pending.next(slot).map(|n| self.pending.get(n)),
            ),
            None => (None, None),
        }
    }

    /// Look up a pending request
    pub fn get(&self, id: RequestId) -> Option<&Request> {
        self.index.get(&id).map(|&slot| self.pending.get(slot))
    }

    /// Whether a request is pending
    pub fn contains(&self, id: RequestId) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Pending requests in ascending sector order
    pub fn iter(&self) -> impl Iterator<Item = &Request> + '_ {
        self.pending.iter()
    }

    /// Sector at which the arm rests
    pub fn head_position(&self) -> Sector {
        self.head_position
    }

    /// Current sweep direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Counters
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Configuration in use
    pub fn config(&self) -> &LookConfig {
        &self.config
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Ordered listing of the queue for tracing
    pub fn snapshot(&self) -> QueueSnapshot {
        let mut entries = Vec::with_capacity(self.pending.len());
        let mut boundary = None;
        for slot in self.pending.slots() {
            if Some(slot) == self.boundary {
                boundary = Some(entries.len());
            }
            entries.push(SnapshotEntry::from(self.pending.get(slot)));
        }

        QueueSnapshot {
            head_position: self.head_position,
            direction: self.direction,
            boundary,
            entries,
        }
    }

    fn traces(&self, event: TraceFlags) -> bool {
        self.config.trace.contains(event)
    }

    fn after_mutation(&self) {
        debug_assert!(self.invariants_hold(), "LOOK queue invariants broken: {:?}", self.snapshot());
        if self.traces(TraceFlags::QUEUE_DUMP) {
            log::debug!("{}", self.snapshot());
        }
    }

    /// Sorted order, a consistent ahead/behind split and a complete index
    fn invariants_hold(&self) -> bool {
        if self.index.len() != self.pending.len() {
            return false;
        }

        let mut previous: Option<Sector> = None;
        let mut reached_boundary = false;
        for slot in self.pending.slots() {
            let start = self.pending.get(slot).start_sector;
            if previous.is_some_and(|p| p > start) {
                return false;
            }
            previous = Some(start);

            if Some(slot) == self.boundary {
                reached_boundary = true;
            }
            let expected = if reached_boundary {
                Side::Ahead
            } else {
                Side::Behind
            };
            if self.side_of(start) != expected {
                return false;
            }
            if self.index.get(&self.pending.get(slot).id) != Some(&slot) {
                return false;
            }
        }
        self.boundary.is_none() || reached_boundary
    }
}
