//! Shared, lock-guarded access to the fleet model.

use std::sync::Arc;

use chainreaction_types::{DelaySeverity, EventId, EventKind, Snapshot, Truck, TruckId};
use parking_lot::RwLock;

use crate::state::FleetState;

/// Clonable handle to the single fleet model shared by the broadcast loop
/// and every client session.
///
/// Mutations are serialized by a write lock. Guards are released before the
/// closure returns, so callers can never hold the lock across an `.await`.
#[derive(Debug, Clone)]
pub struct FleetHandle {
    inner: Arc<RwLock<FleetState>>,
}

impl FleetHandle {
    /// Wrap a fleet model for shared use.
    pub fn new(state: FleetState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Run `f` with shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&FleetState) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive write access. Everything `f` does is atomic
    /// with respect to other readers and writers.
    pub fn write<R>(&self, f: impl FnOnce(&mut FleetState) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// See [`FleetState::advance`].
    pub fn advance(&self) -> usize {
        self.write(FleetState::advance)
    }

    /// See [`FleetState::apply_delay`].
    pub fn apply_delay(&self, truck_id: &TruckId, severity: DelaySeverity) -> bool {
        self.write(|fleet| fleet.apply_delay(truck_id, severity))
    }

    /// See [`FleetState::resolve_delay`].
    pub fn resolve_delay(&self, truck_id: &TruckId) -> bool {
        self.write(|fleet| fleet.resolve_delay(truck_id))
    }

    /// See [`FleetState::record_event`].
    pub fn record_event(
        &self,
        kind: impl Into<EventKind>,
        message: impl Into<String>,
        truck_id: Option<TruckId>,
    ) -> EventId {
        self.write(|fleet| fleet.record_event(kind, message, truck_id))
    }

    /// Take a consistent snapshot under the read lock.
    pub fn snapshot(&self) -> Snapshot {
        self.read(FleetState::snapshot)
    }

    /// Owned copy of a single truck.
    pub fn truck(&self, truck_id: &TruckId) -> Option<Truck> {
        self.read(|fleet| fleet.truck(truck_id).cloned())
    }
}
