//! Core entity structs: trucks, events and broadcast snapshots.
//!
//! All structs serialize with `camelCase` field names, which is the shape
//! the dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventKind, Severity, TruckStatus};
use crate::ids::{ContractId, EventId, TruckId};

/// A geographic coordinate, serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate(pub f64, pub f64);

impl Coordinate {
    /// Create a coordinate from longitude and latitude in degrees.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self(lon, lat)
    }

    /// Longitude in degrees.
    pub const fn lon(self) -> f64 {
        self.0
    }

    /// Latitude in degrees.
    pub const fn lat(self) -> f64 {
        self.1
    }
}

/// A truck in the fleet.
///
/// `position` always equals `route[current_route_index]`, and the index is
/// always within `0..route.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Truck {
    /// Stable truck identifier.
    pub id: TruckId,
    /// Name of the driver operating the truck.
    pub driver: String,
    /// Value of the cargo in dollars.
    pub cargo_value: u64,
    /// Current operational status.
    pub status: TruckStatus,
    /// Current speed in km/h.
    pub velocity: u32,
    /// Current position on the route.
    pub position: Coordinate,
    /// Final destination of the route.
    pub destination: Coordinate,
    /// Ordered waypoints of the route (immutable after creation).
    pub route: Vec<Coordinate>,
    /// Index of the current waypoint in `route`.
    pub current_route_index: usize,
    /// Contract governing the delivery.
    pub contract_id: ContractId,
    /// Estimated time of arrival.
    pub eta: DateTime<Utc>,
}

/// An entry in the fleet event log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Sequence-assigned id (`evt-<n>`).
    #[ts(as = "String")]
    pub id: EventId,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Event category (open set).
    #[serde(rename = "type")]
    #[ts(as = "String")]
    pub kind: EventKind,
    /// Event severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Truck the event refers to, if any.
    pub truck_id: Option<TruckId>,
}

/// Point-in-time copy of the fleet and its recent events.
///
/// Built fresh for every transmission; holds owned values so it can be
/// serialized while the fleet keeps mutating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// All trucks in manifest order.
    pub trucks: Vec<Truck>,
    /// The most recent events, oldest first.
    pub events: Vec<Event>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Look up a truck in the snapshot by id.
    pub fn truck(&self, id: &TruckId) -> Option<&Truck> {
        self.trucks.iter().find(|t| &t.id == id)
    }

    /// Return the newest event in the snapshot, if any.
    pub fn last_event(&self) -> Option<&Event> {
        self.events.last()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_truck() -> Truck {
        let route = vec![Coordinate::new(73.75, 18.47), Coordinate::new(72.87, 19.07)];
        Truck {
            id: TruckId::new("TRK-1"),
            driver: String::from("Test Driver"),
            cargo_value: 1000,
            status: TruckStatus::OnTime,
            velocity: 68,
            position: Coordinate::new(73.75, 18.47),
            destination: Coordinate::new(72.87, 19.07),
            route,
            current_route_index: 0,
            contract_id: ContractId::new("CNT-1"),
            eta: Utc::now(),
        }
    }

    #[test]
    fn truck_serializes_camel_case_with_array_coordinates() {
        let json = serde_json::to_value(sample_truck()).unwrap();
        assert_eq!(json["cargoValue"], 1000);
        assert_eq!(json["currentRouteIndex"], 0);
        assert_eq!(json["contractId"], "CNT-1");
        assert_eq!(json["status"], "on-time");
        assert!(json["position"].is_array());
        assert_eq!(json["route"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn event_uses_type_key_and_null_truck() {
        let event = Event {
            id: EventId(3),
            timestamp: Utc::now(),
            kind: EventKind::System,
            severity: Severity::Info,
            message: String::from("started"),
            truck_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], "evt-00000000000000000003");
        assert_eq!(json["type"], "system");
        assert_eq!(json["severity"], "info");
        assert!(json["truckId"].is_null());
    }

    #[test]
    fn snapshot_lookup_by_id() {
        let snapshot = Snapshot {
            trucks: vec![sample_truck()],
            events: Vec::new(),
            timestamp: Utc::now(),
        };
        assert!(snapshot.truck(&TruckId::new("TRK-1")).is_some());
        assert!(snapshot.truck(&TruckId::new("TRK-2")).is_none());
        assert!(snapshot.last_event().is_none());
    }
}
