//! Logical clock for the broadcast loop.
//!
//! Scenario due times are compared against elapsed time derived from the
//! tick counter (`ticks * interval`), not against the wall clock. A slow
//! tick therefore never causes a scenario to be skipped or fired early, and
//! tests can drive the clock without sleeping.

use std::time::Duration;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Elapsed time cannot be represented.
    #[error("elapsed time overflow at tick {tick}")]
    ElapsedOverflow {
        /// Tick at which the overflow happened.
        tick: u64,
    },
}

/// Tick counter paired with the tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopClock {
    /// Number of ticks completed so far.
    tick: u64,
    /// Logical length of one tick in milliseconds.
    interval_ms: u64,
}

impl LoopClock {
    /// Create a clock at tick zero.
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            tick: 0,
            interval_ms,
        }
    }

    /// Number of ticks completed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Logical length of one tick.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Logical time since the first tick started.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ElapsedOverflow`] if the product does not fit.
    pub fn elapsed(&self) -> Result<Duration, ClockError> {
        self.interval_ms
            .checked_mul(self.tick)
            .map(Duration::from_millis)
            .ok_or(ClockError::ElapsedOverflow { tick: self.tick })
    }

    /// Record a completed tick and return the new tick count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }
}
