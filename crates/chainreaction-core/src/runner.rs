//! Broadcast loop runner.
//!
//! [`BroadcastLoop::run`] drives the tick cycle:
//!
//! - **Startup delay**: wait before the first tick ([`LoopPhase::Waiting`])
//! - **Fixed cadence**: one tick per interval; a late tick delays the
//!   schedule instead of bursting to catch up
//! - **Bounded runs**: optionally stop after `max_ticks`
//! - **Clean shutdown**: stop as soon as the shutdown signal flips
//!
//! Each tick hands its outcome to a [`TickCallback`], which is where
//! snapshots are turned into frames and fanned out. Zero observers or a
//! failed delivery never stop the loop.

use std::sync::Arc;
use std::time::Duration;

use chainreaction_contracts::ContractAnalyzer;
use chainreaction_fleet::FleetHandle;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::clock::{ClockError, LoopClock};
use crate::config::SimulationConfig;
use crate::scenario::ScenarioDriver;
use crate::status::{LoopPhase, LoopStatus};
use crate::tick::{self, TickOutcome};

/// Errors that can occur during the loop run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The clock overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The tick interval is shorter than the clock's one millisecond
    /// resolution.
    #[error("tick interval must be at least 1ms, got {0:?}")]
    IntervalTooShort(Duration),
}

/// Shortest interval the millisecond clock can represent.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// The shutdown signal fired (or its sender was dropped).
    Shutdown,
}

/// Result of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Why the loop stopped.
    pub end_reason: LoopEndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Phase the loop was in when it stopped.
    pub final_phase: LoopPhase,
}

/// Callback invoked after each tick completes.
///
/// Implementations turn the outcome into wire frames and deliver them.
/// The fleet lock is not held while this runs.
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(&mut self, outcome: &TickOutcome);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _outcome: &TickOutcome) {}
}

/// Timing of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Time before the first tick.
    pub startup_delay: Duration,
    /// Stop after this many ticks (0 = unlimited).
    pub max_ticks: u64,
}

impl From<&SimulationConfig> for LoopSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            startup_delay: config.startup_delay(),
            max_ticks: config.max_ticks,
        }
    }
}

/// The periodic producer: owns the scenario driver and the clock.
pub struct BroadcastLoop {
    fleet: FleetHandle,
    scenarios: ScenarioDriver,
    analyzer: Arc<dyn ContractAnalyzer>,
    settings: LoopSettings,
    status: Arc<LoopStatus>,
}

impl BroadcastLoop {
    /// Assemble a loop over a shared fleet.
    pub fn new(
        fleet: FleetHandle,
        scenarios: ScenarioDriver,
        analyzer: Arc<dyn ContractAnalyzer>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            fleet,
            scenarios,
            analyzer,
            settings,
            status: Arc::new(LoopStatus::new()),
        }
    }

    /// Publish progress into an existing status handle.
    #[must_use]
    pub fn with_status(mut self, status: Arc<LoopStatus>) -> Self {
        self.status = status;
        self
    }

    /// Shared progress counters.
    pub fn status(&self) -> Arc<LoopStatus> {
        Arc::clone(&self.status)
    }

    /// Scenario driver state.
    pub const fn scenarios(&self) -> &ScenarioDriver {
        &self.scenarios
    }

    /// Run until `max_ticks` is reached or `shutdown` becomes `true`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::IntervalTooShort`] for an interval under one
    /// millisecond and
    /// [`RunnerError::Clock`] if the clock overflows.
    pub async fn run(
        &mut self,
        callback: &mut dyn TickCallback,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<LoopOutcome, RunnerError> {
        if self.settings.tick_interval < MIN_TICK_INTERVAL {
            return Err(RunnerError::IntervalTooShort(self.settings.tick_interval));
        }
        let interval_ms =
            u64::try_from(self.settings.tick_interval.as_millis()).unwrap_or(u64::MAX);
        let mut clock = LoopClock::new(interval_ms);

        info!(
            tick_interval_ms = interval_ms,
            startup_delay_ms = self.settings.startup_delay.as_millis(),
            max_ticks = self.settings.max_ticks,
            scenarios = self.scenarios.len(),
            "Broadcast loop starting"
        );

        if *shutdown.borrow() {
            return Ok(self.finish(LoopEndReason::Shutdown, &clock, LoopPhase::Waiting));
        }

        // --- Waiting ---
        if !self.settings.startup_delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(self.settings.startup_delay) => {}
                () = wait_for_shutdown(&mut shutdown) => {
                    return Ok(self.finish(LoopEndReason::Shutdown, &clock, LoopPhase::Waiting));
                }
            }
        }

        // --- Ticking ---
        self.status.mark_ticking();
        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = wait_for_shutdown(&mut shutdown) => {
                    return Ok(self.finish(LoopEndReason::Shutdown, &clock, LoopPhase::Ticking));
                }
            }

            let outcome = tick::run_tick(
                &mut clock,
                &self.fleet,
                &mut self.scenarios,
                self.analyzer.as_ref(),
            )?;
            self.status.record_tick(clock.tick());
            callback.on_tick(&outcome);

            if self.settings.max_ticks > 0 && clock.tick() >= self.settings.max_ticks {
                return Ok(self.finish(LoopEndReason::MaxTicksReached, &clock, LoopPhase::Ticking));
            }
        }
    }

    fn finish(
        &self,
        end_reason: LoopEndReason,
        clock: &LoopClock,
        final_phase: LoopPhase,
    ) -> LoopOutcome {
        let outcome = LoopOutcome {
            end_reason,
            total_ticks: clock.tick(),
            final_phase,
        };
        log_loop_end(&outcome, self.scenarios.pending());
        outcome
    }
}

/// Resolve once the shutdown flag is `true` or its sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        debug!("Shutdown sender dropped, stopping loop");
    }
}

fn log_loop_end(outcome: &LoopOutcome, pending_scenarios: usize) {
    info!(
        reason = ?outcome.end_reason,
        total_ticks = outcome.total_ticks,
        phase = ?outcome.final_phase,
        pending_scenarios,
        "Broadcast loop ended"
    );
}
