//! One tick of the broadcast loop.
//!
//! A tick runs three steps under a single fleet write lock:
//!
//! 1. **Advance** -- move every on-time, moving truck one waypoint.
//! 2. **Scenarios** -- fire every scenario due at the current elapsed time.
//! 3. **Snapshot** -- copy the fleet and the recent event window.
//!
//! Holding one lock across all three makes the snapshot atomic with respect
//! to command-driven mutations from client sessions. Delivery happens after
//! the lock is released.

use std::time::Duration;

use chainreaction_contracts::ContractAnalyzer;
use chainreaction_fleet::FleetHandle;
use chainreaction_types::Snapshot;
use tracing::debug;

use crate::clock::{ClockError, LoopClock};
use crate::scenario::{ScenarioDriver, ScenarioNotice};

/// Everything a tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Zero-based index of the tick that ran.
    pub tick: u64,
    /// Logical time at which the tick ran.
    pub elapsed: Duration,
    /// Number of trucks that moved.
    pub moved: usize,
    /// Notices from scenarios fired this tick, in firing order.
    pub notices: Vec<ScenarioNotice>,
    /// Fleet state at the end of the tick.
    pub snapshot: Snapshot,
}

/// Run one tick and advance the clock.
///
/// # Errors
///
/// Returns [`ClockError`] if the tick counter or elapsed time overflows.
pub fn run_tick(
    clock: &mut LoopClock,
    fleet: &FleetHandle,
    scenarios: &mut ScenarioDriver,
    analyzer: &dyn ContractAnalyzer,
) -> Result<TickOutcome, ClockError> {
    let tick = clock.tick();
    let elapsed = clock.elapsed()?;

    let (moved, notices, snapshot) = fleet.write(|state| {
        let moved = state.advance();
        let notices = scenarios.run(elapsed, state, analyzer);
        (moved, notices, state.snapshot())
    });

    clock.advance()?;

    debug!(
        tick,
        elapsed_ms = elapsed.as_millis(),
        moved,
        notices = notices.len(),
        "Tick complete"
    );

    Ok(TickOutcome {
        tick,
        elapsed,
        moved,
        notices,
        snapshot,
    })
}
