//! Tick callback that fans each tick out to observers.
//!
//! Notices go first, then the `state_update` snapshot, so an observer
//! sees an opportunity before the state that follows it.

use std::sync::Arc;

use chainreaction_core::runner::TickCallback;
use chainreaction_core::scenario::ScenarioNotice;
use chainreaction_core::tick::TickOutcome;
use chainreaction_observer::state::AppState;
use chainreaction_types::ServerMessage;
use tracing::{debug, warn};

/// Callback that bridges the broadcast loop to the connection registry.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a callback publishing through `state`.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn publish(&self, message: &ServerMessage) -> usize {
        match self.state.registry.broadcast_message(message) {
            Ok(report) => {
                self.state
                    .loop_status
                    .record_broadcast(u64::try_from(report.delivered).unwrap_or(u64::MAX));
                report.delivered
            }
            Err(e) => {
                warn!(error = %e, kind = message.kind(), "Failed to encode broadcast");
                0
            }
        }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, outcome: &TickOutcome) {
        for notice in &outcome.notices {
            match notice {
                ScenarioNotice::ArbitrageOpportunity(analysis) => {
                    self.publish(&ServerMessage::ArbitrageOpportunity {
                        data: analysis.clone(),
                    });
                }
            }
        }

        let delivered = self.publish(&ServerMessage::StateUpdate {
            data: outcome.snapshot.clone(),
        });
        debug!(
            tick = outcome.tick,
            moved = outcome.moved,
            notices = outcome.notices.len(),
            delivered,
            "Tick broadcast"
        );
    }
}
