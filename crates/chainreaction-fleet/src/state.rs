//! The fleet state model.
//!
//! [`FleetState`] owns every truck plus the event log and is mutated through
//! `&mut self` methods. It performs no locking of its own; concurrent access
//! goes through [`crate::FleetHandle`].
//!
//! # Tick rules
//!
//! - Only trucks that are on time and have a positive velocity move, one
//!   waypoint per tick.
//! - Moving past the final waypoint wraps back to the origin (round trip).
//! - Delays and recoveries change status and velocity and always record an
//!   event referencing the truck.

use std::collections::BTreeSet;

use chainreaction_types::{
    DelaySeverity, Event, EventId, EventKind, Severity, Snapshot, Truck, TruckId, TruckStatus,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::FleetError;
use crate::event_log::EventLog;
use crate::manifest::TruckSpec;
use crate::route::{DEFAULT_ROUTE_JITTER, DEFAULT_ROUTE_STEPS, generate_route};

/// Number of events exposed in a snapshot by default.
pub const DEFAULT_EVENT_WINDOW: usize = 10;

/// Number of events retained internally by default.
pub const DEFAULT_EVENT_RETENTION: usize = 1000;

/// Speed floor after a major delay, in km/h.
const MAJOR_DELAY_FLOOR: u32 = 20;
/// Speed lost to a major delay, in km/h.
const MAJOR_DELAY_DROP: u32 = 40;
/// Speed floor after a minor delay, in km/h.
const MINOR_DELAY_FLOOR: u32 = 40;
/// Speed lost to a minor delay, in km/h.
const MINOR_DELAY_DROP: u32 = 20;

/// Tunable parameters of the fleet model.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetParams {
    /// Interpolation steps per generated route.
    pub route_steps: u32,
    /// Maximum per-coordinate jitter in degrees.
    pub route_jitter: f64,
    /// Number of recent events included in a snapshot.
    pub event_window: usize,
    /// Number of events retained internally (raised to the window if lower).
    pub event_retention: usize,
    /// Lower bound of the recovery speed, inclusive.
    pub recovery_speed_min: u32,
    /// Upper bound of the recovery speed, inclusive.
    pub recovery_speed_max: u32,
    /// RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for FleetParams {
    fn default() -> Self {
        Self {
            route_steps: DEFAULT_ROUTE_STEPS,
            route_jitter: DEFAULT_ROUTE_JITTER,
            event_window: DEFAULT_EVENT_WINDOW,
            event_retention: DEFAULT_EVENT_RETENTION,
            recovery_speed_min: 60,
            recovery_speed_max: 75,
            seed: None,
        }
    }
}

impl FleetParams {
    fn validate(&self) -> Result<(), FleetError> {
        if self.event_window == 0 {
            return Err(FleetError::InvalidParams {
                reason: String::from("event_window must be at least 1"),
            });
        }
        if self.recovery_speed_min > self.recovery_speed_max {
            return Err(FleetError::InvalidParams {
                reason: format!(
                    "recovery speed range is empty: {}..={}",
                    self.recovery_speed_min, self.recovery_speed_max
                ),
            });
        }
        if !self.route_jitter.is_finite() || self.route_jitter < 0.0 {
            return Err(FleetError::InvalidParams {
                reason: format!("route_jitter must be a non-negative number, got {}", self.route_jitter),
            });
        }
        Ok(())
    }
}

/// Server-authoritative model of the fleet and its event log.
#[derive(Debug)]
pub struct FleetState {
    trucks: Vec<Truck>,
    events: EventLog,
    rng: StdRng,
    params: FleetParams,
}

impl FleetState {
    /// Build the fleet from a manifest, generating one route per truck.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError`] if the parameters are invalid or the manifest
    /// contains an empty or duplicate truck id.
    pub fn from_manifest(manifest: &[TruckSpec], params: FleetParams) -> Result<Self, FleetError> {
        params.validate()?;
        let mut rng = params
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let now = Utc::now();

        let trucks = manifest
            .iter()
            .map(|spec| {
                let route = generate_route(
                    spec.origin,
                    spec.destination,
                    params.route_steps,
                    params.route_jitter,
                    &mut rng,
                );
                let position = route.first().copied().unwrap_or(spec.origin);
                Truck {
                    id: spec.id.clone(),
                    driver: spec.driver.clone(),
                    cargo_value: spec.cargo_value,
                    status: TruckStatus::OnTime,
                    velocity: spec.velocity,
                    position,
                    destination: spec.destination,
                    route,
                    current_route_index: 0,
                    contract_id: spec.contract_id.clone(),
                    eta: eta_after(now, spec.eta_hours),
                }
            })
            .collect();

        Self::with_rng(trucks, params, rng)
    }

    /// Build the fleet from fully formed trucks.
    ///
    /// Each truck's position is reset to the waypoint at its route index.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError`] on invalid parameters, empty or duplicate ids,
    /// or a truck without waypoints.
    pub fn from_trucks(trucks: Vec<Truck>, params: FleetParams) -> Result<Self, FleetError> {
        params.validate()?;
        let rng = params
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(trucks, params, rng)
    }

    fn with_rng(
        mut trucks: Vec<Truck>,
        params: FleetParams,
        rng: StdRng,
    ) -> Result<Self, FleetError> {
        let mut seen = BTreeSet::new();
        for (index, truck) in trucks.iter_mut().enumerate() {
            if truck.id.as_str().is_empty() {
                return Err(FleetError::EmptyTruckId { index });
            }
            if !seen.insert(truck.id.clone()) {
                return Err(FleetError::DuplicateTruck(truck.id.clone()));
            }
            if truck.current_route_index >= truck.route.len() {
                truck.current_route_index = 0;
            }
            let Some(position) = truck.route.get(truck.current_route_index).copied() else {
                return Err(FleetError::EmptyRoute(truck.id.clone()));
            };
            truck.position = position;
        }

        let retention = params.event_retention.max(params.event_window);
        info!(
            trucks = trucks.len(),
            event_window = params.event_window,
            event_retention = retention,
            "Fleet model initialized"
        );

        Ok(Self {
            trucks,
            events: EventLog::new(retention),
            rng,
            params,
        })
    }

    /// Move every eligible truck one waypoint along its route.
    ///
    /// Returns the number of trucks that moved.
    pub fn advance(&mut self) -> usize {
        let mut moved: usize = 0;
        for truck in &mut self.trucks {
            if truck.status != TruckStatus::OnTime || truck.velocity == 0 {
                continue;
            }
            let next = truck.current_route_index.saturating_add(1);
            let next = if next >= truck.route.len() { 0 } else { next };
            if let Some(position) = truck.route.get(next).copied() {
                truck.current_route_index = next;
                truck.position = position;
                moved = moved.saturating_add(1);
            }
        }
        moved
    }

    /// Apply a disruption to a truck.
    ///
    /// Returns `false` and changes nothing if the truck is unknown.
    pub fn apply_delay(&mut self, truck_id: &TruckId, severity: DelaySeverity) -> bool {
        let Some(truck) = self.trucks.iter_mut().find(|t| &t.id == truck_id) else {
            debug!(truck_id = %truck_id, "apply_delay ignored: unknown truck");
            return false;
        };

        let (velocity, status) = match severity {
            DelaySeverity::Critical => (0, TruckStatus::Critical),
            DelaySeverity::Major => (
                truck.velocity.saturating_sub(MAJOR_DELAY_DROP).max(MAJOR_DELAY_FLOOR),
                TruckStatus::Delayed,
            ),
            DelaySeverity::Minor => (
                truck.velocity.saturating_sub(MINOR_DELAY_DROP).max(MINOR_DELAY_FLOOR),
                TruckStatus::Delayed,
            ),
        };
        truck.velocity = velocity;
        truck.status = status;

        info!(truck_id = %truck_id, ?severity, velocity, "Delay applied");
        self.events.append(
            EventKind::Alert,
            Severity::from(severity),
            format!("{truck_id} - Delay detected. Speed: {velocity} km/h"),
            Some(truck_id.clone()),
        );
        true
    }

    /// Return a truck to normal operation at a fresh recovery speed.
    ///
    /// Returns `false` and changes nothing (no event) if the truck is
    /// unknown.
    pub fn resolve_delay(&mut self, truck_id: &TruckId) -> bool {
        let Some(truck) = self.trucks.iter_mut().find(|t| &t.id == truck_id) else {
            debug!(truck_id = %truck_id, "resolve_delay ignored: unknown truck");
            return false;
        };

        let velocity = self
            .rng
            .random_range(self.params.recovery_speed_min..=self.params.recovery_speed_max);
        truck.velocity = velocity;
        truck.status = TruckStatus::OnTime;

        info!(truck_id = %truck_id, velocity, "Delay resolved");
        self.events.append(
            EventKind::Success,
            Severity::Info,
            format!("{truck_id} - Issue resolved. Resuming normal speed."),
            Some(truck_id.clone()),
        );
        true
    }

    /// Append an informational event. The kind is not validated.
    pub fn record_event(
        &mut self,
        kind: impl Into<EventKind>,
        message: impl Into<String>,
        truck_id: Option<TruckId>,
    ) -> EventId {
        self.events
            .append(kind.into(), Severity::Info, message, truck_id)
    }

    /// Take an owned point-in-time copy of the fleet and recent events.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            trucks: self.trucks.clone(),
            events: self.events.recent(self.params.event_window),
            timestamp: Utc::now(),
        }
    }

    /// Borrow a truck by id.
    pub fn truck(&self, truck_id: &TruckId) -> Option<&Truck> {
        self.trucks.iter().find(|t| &t.id == truck_id)
    }

    /// All trucks in manifest order.
    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    /// Up to `n` most recent events, oldest first.
    pub fn recent_events(&self, n: usize) -> Vec<Event> {
        self.events.recent(n)
    }

    /// The newest event, if any.
    pub fn last_event(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Total number of events ever recorded.
    pub const fn event_count(&self) -> u64 {
        self.events.total_appended()
    }

    /// The parameters the fleet was built with.
    pub const fn params(&self) -> &FleetParams {
        &self.params
    }
}

fn eta_after(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chainreaction_types::{ContractId, Coordinate};

    use super::*;
    use crate::manifest::default_manifest;

    fn seeded() -> FleetParams {
        FleetParams {
            seed: Some(42),
            ..FleetParams::default()
        }
    }

    fn demo_fleet() -> FleetState {
        FleetState::from_manifest(&default_manifest(), seeded()).unwrap()
    }

    fn trk(id: &str) -> TruckId {
        TruckId::new(id)
    }

    fn straight_truck(id: &str, waypoints: usize) -> Truck {
        let route: Vec<_> = (0..waypoints)
            .map(|i| Coordinate::new(f64::from(u32::try_from(i).unwrap()), 0.0))
            .collect();
        Truck {
            id: trk(id),
            driver: String::from("Driver"),
            cargo_value: 1,
            status: TruckStatus::OnTime,
            velocity: 50,
            position: Coordinate::default(),
            destination: route.last().copied().unwrap_or_default(),
            route,
            current_route_index: 0,
            contract_id: ContractId::new("CNT-X"),
            eta: Utc::now(),
        }
    }

    #[test]
    fn manifest_builds_trucks_at_route_start() {
        let fleet = demo_fleet();
        assert_eq!(fleet.trucks().len(), 3);
        for truck in fleet.trucks() {
            assert_eq!(truck.route.len(), 21);
            assert_eq!(truck.current_route_index, 0);
            assert_eq!(truck.position, truck.route[0]);
            assert_eq!(truck.status, TruckStatus::OnTime);
            assert!(truck.eta > Utc::now());
        }
        assert_eq!(fleet.truck(&trk("TRK-402")).unwrap().velocity, 68);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut manifest = default_manifest();
        manifest.push(manifest[0].clone());
        let err = FleetState::from_manifest(&manifest, seeded()).unwrap_err();
        assert!(matches!(err, FleetError::DuplicateTruck(id) if id == trk("TRK-402")));
    }

    #[test]
    fn empty_id_and_empty_route_are_rejected() {
        let mut manifest = default_manifest();
        manifest[1].id = trk("");
        assert!(matches!(
            FleetState::from_manifest(&manifest, seeded()),
            Err(FleetError::EmptyTruckId { index: 1 })
        ));

        let truck = straight_truck("TRK-1", 0);
        assert!(matches!(
            FleetState::from_trucks(vec![truck], seeded()),
            Err(FleetError::EmptyRoute(_))
        ));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = FleetParams {
            recovery_speed_min: 80,
            recovery_speed_max: 70,
            ..seeded()
        };
        assert!(matches!(
            FleetState::from_manifest(&default_manifest(), params),
            Err(FleetError::InvalidParams { .. })
        ));
    }

    #[test]
    fn advance_keeps_index_in_bounds_and_round_trips() {
        let mut fleet = demo_fleet();
        let len = fleet.truck(&trk("TRK-402")).unwrap().route.len();
        for _ in 0..len {
            fleet.advance();
            for truck in fleet.trucks() {
                assert!(truck.current_route_index < truck.route.len());
                assert_eq!(truck.position, truck.route[truck.current_route_index]);
            }
        }
        // A full cycle of len advances returns every moving truck to the origin.
        for truck in fleet.trucks() {
            assert_eq!(truck.current_route_index, 0);
        }
    }

    #[test]
    fn advance_wraps_after_last_waypoint() {
        let mut fleet = FleetState::from_trucks(vec![straight_truck("TRK-1", 3)], seeded()).unwrap();
        assert_eq!(fleet.advance(), 1);
        assert_eq!(fleet.advance(), 1);
        assert_eq!(fleet.trucks()[0].current_route_index, 2);
        fleet.advance();
        assert_eq!(fleet.trucks()[0].current_route_index, 0);
        assert_eq!(fleet.trucks()[0].position, Coordinate::new(0.0, 0.0));
    }

    #[test]
    fn single_waypoint_route_stays_put() {
        let mut fleet = FleetState::from_trucks(vec![straight_truck("TRK-1", 1)], seeded()).unwrap();
        fleet.advance();
        assert_eq!(fleet.trucks()[0].current_route_index, 0);
    }

    #[test]
    fn delayed_and_stopped_trucks_do_not_move() {
        let mut fleet = demo_fleet();
        assert!(fleet.apply_delay(&trk("TRK-402"), DelaySeverity::Critical));
        assert!(fleet.apply_delay(&trk("TRK-305"), DelaySeverity::Minor));
        assert_eq!(fleet.advance(), 1);
        assert_eq!(fleet.truck(&trk("TRK-402")).unwrap().current_route_index, 0);
        assert_eq!(fleet.truck(&trk("TRK-305")).unwrap().current_route_index, 0);
        assert_eq!(fleet.truck(&trk("TRK-518")).unwrap().current_route_index, 1);
    }

    #[test]
    fn critical_delay_stops_truck_and_records_alert() {
        let mut fleet = demo_fleet();
        assert!(fleet.apply_delay(&trk("TRK-402"), DelaySeverity::Critical));
        let truck = fleet.truck(&trk("TRK-402")).unwrap();
        assert_eq!(truck.velocity, 0);
        assert_eq!(truck.status, TruckStatus::Critical);

        let event = fleet.last_event().unwrap();
        assert_eq!(event.kind, EventKind::Alert);
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.truck_id, Some(trk("TRK-402")));
        assert_eq!(event.message, "TRK-402 - Delay detected. Speed: 0 km/h");
    }

    #[test]
    fn major_and_minor_delays_respect_speed_floors() {
        let mut fleet = demo_fleet();
        // 72 - 40 = 32
        fleet.apply_delay(&trk("TRK-305"), DelaySeverity::Major);
        assert_eq!(fleet.truck(&trk("TRK-305")).unwrap().velocity, 32);
        // 32 - 40 saturates, floor 20
        fleet.apply_delay(&trk("TRK-305"), DelaySeverity::Major);
        assert_eq!(fleet.truck(&trk("TRK-305")).unwrap().velocity, 20);
        // 65 - 20 = 45
        fleet.apply_delay(&trk("TRK-518"), DelaySeverity::Minor);
        let truck = fleet.truck(&trk("TRK-518")).unwrap();
        assert_eq!(truck.velocity, 45);
        assert_eq!(truck.status, TruckStatus::Delayed);
        // 45 - 20 = 25, floor 40
        fleet.apply_delay(&trk("TRK-518"), DelaySeverity::Minor);
        assert_eq!(fleet.truck(&trk("TRK-518")).unwrap().velocity, 40);
        assert_eq!(fleet.last_event().unwrap().severity, Severity::Minor);
    }

    #[test]
    fn unknown_truck_delay_is_a_no_op() {
        let mut fleet = demo_fleet();
        let before = fleet.snapshot();
        assert!(!fleet.apply_delay(&trk("TRK-000"), DelaySeverity::Critical));
        assert_eq!(fleet.event_count(), 0);
        assert_eq!(fleet.trucks(), before.trucks.as_slice());
    }

    #[test]
    fn resolve_unknown_truck_changes_nothing() {
        let mut fleet = demo_fleet();
        fleet.apply_delay(&trk("TRK-402"), DelaySeverity::Critical);
        let before = fleet.snapshot();
        assert!(!fleet.resolve_delay(&trk("TRK-999")));
        let after = fleet.snapshot();
        assert_eq!(before.trucks, after.trucks);
        assert_eq!(before.events, after.events);
    }

    #[test]
    fn resolve_restores_on_time_within_recovery_range() {
        let mut fleet = demo_fleet();
        fleet.apply_delay(&trk("TRK-402"), DelaySeverity::Critical);
        assert!(fleet.resolve_delay(&trk("TRK-402")));
        let truck = fleet.truck(&trk("TRK-402")).unwrap();
        assert_eq!(truck.status, TruckStatus::OnTime);
        assert!((60..=75).contains(&truck.velocity));

        let event = fleet.last_event().unwrap();
        assert_eq!(event.kind, EventKind::Success);
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.message, "TRK-402 - Issue resolved. Resuming normal speed.");
    }

    #[test]
    fn record_event_accepts_any_kind() {
        let mut fleet = demo_fleet();
        let id = fleet.record_event("custom-kind", "hello", None);
        let event = fleet.last_event().unwrap();
        assert_eq!(event.id, id);
        assert_eq!(event.kind, EventKind::Other(String::from("custom-kind")));
        assert_eq!(event.severity, Severity::Info);
        assert!(event.truck_id.is_none());
    }

    #[test]
    fn snapshot_window_holds_most_recent_events() {
        let mut fleet = demo_fleet();
        for i in 0..25 {
            fleet.record_event(EventKind::Info, format!("event {i}"), None);
        }
        let snap = fleet.snapshot();
        assert_eq!(snap.events.len(), DEFAULT_EVENT_WINDOW);
        assert_eq!(snap.events.first().unwrap().message, "event 15");
        assert_eq!(snap.last_event().unwrap().message, "event 24");
        assert_eq!(fleet.event_count(), 25);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut fleet = demo_fleet();
        let snap = fleet.snapshot();
        fleet.advance();
        fleet.apply_delay(&trk("TRK-402"), DelaySeverity::Critical);
        assert_eq!(snap.truck(&trk("TRK-402")).unwrap().current_route_index, 0);
        assert_eq!(snap.truck(&trk("TRK-402")).unwrap().velocity, 68);
        assert!(snap.events.is_empty());
    }

    #[test]
    fn same_seed_builds_same_routes() {
        let a = demo_fleet();
        let b = demo_fleet();
        assert_eq!(a.trucks()[0].route, b.trucks()[0].route);
    }
}
