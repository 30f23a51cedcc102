//! Shared application state for the observer server.
//!
//! [`AppState`] is the composition point between the fleet model, the
//! contract collaborator, the broadcast loop status and the connection
//! registry. It is built once in the binary and shared behind an `Arc`
//! by every handler and session.

use std::sync::Arc;

use chainreaction_contracts::ContractAnalyzer;
use chainreaction_core::status::LoopStatus;
use chainreaction_fleet::FleetHandle;
use chrono::{DateTime, Utc};

use crate::limiter::ConnectionLimiter;
use crate::registry::ConnectionRegistry;

/// Default per-connection outbound queue capacity.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// State shared by every route and `WebSocket` session.
pub struct AppState {
    /// Live fleet model.
    pub fleet: FleetHandle,
    /// Registered observers.
    pub registry: ConnectionRegistry,
    /// Contract collaborator.
    pub analyzer: Arc<dyn ContractAnalyzer>,
    /// Cap on concurrent observer connections.
    pub limiter: Arc<ConnectionLimiter>,
    /// Broadcast loop counters, written by the loop.
    pub loop_status: Arc<LoopStatus>,
    /// Bound of each observer's outbound queue.
    pub outbound_queue_capacity: usize,
    /// When the server state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with an unlimited connection cap and default queue size.
    pub fn new(fleet: FleetHandle, analyzer: Arc<dyn ContractAnalyzer>) -> Self {
        Self {
            fleet,
            registry: ConnectionRegistry::new(),
            analyzer,
            limiter: Arc::new(ConnectionLimiter::new(0)),
            loop_status: Arc::new(LoopStatus::new()),
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            started_at: Utc::now(),
        }
    }

    /// Cap concurrent observers. `0` means unlimited.
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.limiter = Arc::new(ConnectionLimiter::new(max));
        self
    }

    /// Set the per-connection outbound queue bound.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.outbound_queue_capacity = capacity;
        self
    }

    /// Share the broadcast loop's status counters.
    #[must_use]
    pub fn with_loop_status(mut self, status: Arc<LoopStatus>) -> Self {
        self.loop_status = status;
        self
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("connections", &self.registry.len())
            .field("outbound_queue_capacity", &self.outbound_queue_capacity)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
