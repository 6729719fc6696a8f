//! Runtime counters.
//!
//! Lock-free `AtomicU64` counters bumped by the engine and read by whoever
//! exports them (server console, dashboards, tests).

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for engine events since startup.
#[derive(Debug, Default)]
pub struct CtfCounters {
    /// Flags deployed by `prepare`.
    pub flags_deployed: AtomicU64,
    /// Successful pick-ups.
    pub pickups: AtomicU64,
    /// Successful captures.
    pub captures: AtomicU64,
    /// Flags dropped on logout or death.
    pub drops: AtomicU64,
    /// Interactions rejected by a rule.
    pub rejections: AtomicU64,
    /// Phase transitions performed.
    pub phase_transitions: AtomicU64,
}

impl CtfCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags_deployed: AtomicU64::new(0),
            pickups: AtomicU64::new(0),
            captures: AtomicU64::new(0),
            drops: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            phase_transitions: AtomicU64::new(0),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            flags_deployed: self.flags_deployed.load(Ordering::Relaxed),
            pickups: self.pickups.load(Ordering::Relaxed),
            captures: self.captures.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            phase_transitions: self.phase_transitions.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Flags deployed.
    pub flags_deployed: u64,
    /// Pick-ups.
    pub pickups: u64,
    /// Captures.
    pub captures: u64,
    /// Drops.
    pub drops: u64,
    /// Rejected interactions.
    pub rejections: u64,
    /// Phase transitions.
    pub phase_transitions: u64,
}
