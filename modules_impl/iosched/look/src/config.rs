//! # Elevator Configuration
//!
//! Per-device settings for the LOOK queue: where the arm starts, which way
//! it first sweeps, and which events are traced through `log`.

use crate::queue::Direction;
use crate::request::Sector;

/// Default arena pre-allocation
pub const DEFAULT_CAPACITY: usize = 128;

bitflags::bitflags! {
    /// Events reported through the `log` facade
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TraceFlags: u32 {
        /// Request accepted into the queue
        const INSERT = 1 << 0;
        /// Request released to the dispatch sink
        const DISPATCH = 1 << 1;
        /// Request removed after a merge or cancel
        const REMOVE = 1 << 2;
        /// Sweep direction reversed
        const FLIP = 1 << 3;
        /// Full queue listing after every mutation
        const QUEUE_DUMP = 1 << 4;
    }
}

impl Default for TraceFlags {
    fn default() -> Self {
        Self::INSERT | Self::DISPATCH | Self::REMOVE | Self::FLIP
    }
}

/// LOOK queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookConfig {
    /// Sweep direction before the first dispatch
    pub initial_direction: Direction,
    /// Arm position before the first dispatch
    pub initial_head: Sector,
    /// Number of request slots allocated up front
    pub capacity: usize,
    /// Events to trace
    pub trace: TraceFlags,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            initial_direction: Direction::Forward,
            initial_head: 0,
            capacity: DEFAULT_CAPACITY,
            trace: TraceFlags::default(),
        }
    }
}

impl LookConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial sweep direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.initial_direction = direction;
        self
    }

    /// Set the initial arm position
    pub fn with_head(mut self, head: Sector) -> Self {
        self.initial_head = head;
        self
    }

    /// Set the slot pre-allocation
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the traced events
    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.trace = trace;
        self
    }

    /// Disable all tracing
    pub fn quiet(self) -> Self {
        self.with_trace(TraceFlags::empty())
    }
}
