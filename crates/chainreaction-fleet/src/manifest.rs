//! Fleet manifest: the trucks that exist when the model starts.
//!
//! A manifest entry carries everything needed to materialize a
//! [`chainreaction_types::Truck`] except its route, which is generated from
//! the origin and destination when the fleet is built.

use chainreaction_types::{ContractId, Coordinate, TruckId};
use serde::{Deserialize, Serialize};

/// Blueprint for one truck in the starting fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckSpec {
    /// Unique truck identifier.
    pub id: TruckId,
    /// Driver name.
    pub driver: String,
    /// Cargo value in dollars.
    pub cargo_value: u64,
    /// Initial speed in km/h.
    pub velocity: u32,
    /// Route origin as `[lon, lat]`.
    pub origin: Coordinate,
    /// Route destination as `[lon, lat]`.
    pub destination: Coordinate,
    /// Contract governing the delivery.
    pub contract_id: ContractId,
    /// Hours from fleet creation until the estimated arrival.
    pub eta_hours: u32,
}

#[allow(clippy::too_many_arguments)]
fn spec(
    id: &str,
    driver: &str,
    cargo_value: u64,
    velocity: u32,
    origin: (f64, f64),
    destination: (f64, f64),
    contract_id: &str,
    eta_hours: u32,
) -> TruckSpec {
    TruckSpec {
        id: TruckId::new(id),
        driver: driver.to_owned(),
        cargo_value,
        velocity,
        origin: Coordinate::new(origin.0, origin.1),
        destination: Coordinate::new(destination.0, destination.1),
        contract_id: ContractId::new(contract_id),
        eta_hours,
    }
}

/// The three-truck demo fleet.
///
/// | Truck | Driver | Corridor | Contract |
/// |-------|--------|----------|----------|
/// | TRK-402 | Priya Sharma | Pune to Mumbai | CNT-2024-001 |
/// | TRK-305 | Rajesh Kumar | Bangalore to Hyderabad | CNT-2024-002 |
/// | TRK-518 | Amit Patel | Kolkata to Bhubaneswar | CNT-2024-003 |
pub fn default_manifest() -> Vec<TruckSpec> {
    vec![
        spec(
            "TRK-402",
            "Priya Sharma",
            120_000,
            68,
            (73.7567, 18.4704),
            (72.8777, 19.0760),
            "CNT-2024-001",
            3,
        ),
        spec(
            "TRK-305",
            "Rajesh Kumar",
            85_000,
            72,
            (77.5946, 12.9716),
            (78.4867, 17.3850),
            "CNT-2024-002",
            4,
        ),
        spec(
            "TRK-518",
            "Amit Patel",
            95_000,
            65,
            (88.3639, 22.5726),
            (85.8245, 20.2961),
            "CNT-2024-003",
            5,
        ),
    ]
}
