//! Shared, lock-free view of the broadcast loop's progress.
//!
//! The loop writes; HTTP handlers read. Every field is an atomic so the
//! tick path never waits on a reader.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Phase of the broadcast loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    /// Sleeping through the startup delay.
    Waiting,
    /// Producing a tick every interval.
    Ticking,
}

/// Progress counters published by the broadcast loop.
#[derive(Debug, Default)]
pub struct LoopStatus {
    ticking: AtomicBool,
    ticks: AtomicU64,
    broadcasts: AtomicU64,
}

impl LoopStatus {
    /// Create a status in the waiting phase with zero ticks.
    pub const fn new() -> Self {
        Self {
            ticking: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> LoopPhase {
        if self.ticking.load(Ordering::Acquire) {
            LoopPhase::Ticking
        } else {
            LoopPhase::Waiting
        }
    }

    /// Record the transition out of the startup delay.
    pub fn mark_ticking(&self) {
        self.ticking.store(true, Ordering::Release);
    }

    /// Number of ticks completed.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Record a completed tick.
    pub fn record_tick(&self, total: u64) {
        self.ticks.store(total, Ordering::Release);
    }

    /// Number of frames fanned out to observers since startup.
    pub fn broadcasts(&self) -> u64 {
        self.broadcasts.load(Ordering::Acquire)
    }

    /// Add `delivered` fan-out deliveries to the running total.
    pub fn record_broadcast(&self, delivered: u64) {
        // fetch_add wraps; the counter is informational only.
        self.broadcasts.fetch_add(delivered, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_waiting() {
        let status = LoopStatus::new();
        assert_eq!(status.phase(), LoopPhase::Waiting);
        assert_eq!(status.ticks(), 0);
    }

    #[test]
    fn records_progress() {
        let status = LoopStatus::new();
        status.mark_ticking();
        status.record_tick(4);
        status.record_broadcast(3);
        status.record_broadcast(2);
        assert_eq!(status.phase(), LoopPhase::Ticking);
        assert_eq!(status.ticks(), 4);
        assert_eq!(status.broadcasts(), 5);
    }
}
