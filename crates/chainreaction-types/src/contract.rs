//! Contract, penalty and arbitrage records exchanged with the contract
//! analyzer.
//!
//! Money amounts are [`Decimal`] internally and plain JSON numbers on the
//! wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Availability;
use crate::ids::{ContractId, TruckId};

/// A delivery contract with its penalty clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Contract {
    /// Contract identifier.
    pub id: ContractId,
    /// Client the delivery is for.
    pub client: String,
    /// Human-readable route description (e.g. "Pune to Mumbai").
    pub route: String,
    /// Value of the cargo in dollars.
    pub cargo_value: u64,
    /// Deadline for delivery.
    pub delivery_deadline: DateTime<Utc>,
    /// Penalty charged per hour of delay.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub penalty_per_hour: Decimal,
    /// Cap on the total penalty.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub max_penalty: Decimal,
    /// Contract terms text.
    pub terms: String,
}

/// Result of applying a contract's penalty clause to a delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PenaltyAssessment {
    /// Contract the penalty was computed for.
    pub contract_id: ContractId,
    /// Delay in hours.
    pub delay_hours: f64,
    /// Penalty charged per hour of delay.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub penalty_per_hour: Decimal,
    /// `min(penalty_per_hour * delay_hours, max_penalty)`.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub calculated_penalty: Decimal,
    /// Cap on the total penalty.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub max_penalty: Decimal,
    /// Contract terms text.
    pub terms: String,
}

/// A carrier offering relief capacity on the spot market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SpotQuote {
    /// Carrier name.
    pub provider: String,
    /// Base cost of dispatching a relief truck.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub base_cost: Decimal,
    /// Time until the relief truck arrives (e.g. "45 minutes").
    pub eta: String,
    /// Current capacity.
    pub availability: Availability,
}

/// Recommendation produced by arbitrage analysis.
///
/// Serialized inline into [`ArbitrageAnalysis`] with a `recommendation`
/// tag of `EXECUTE` or `WAIT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(
    tag = "recommendation",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
#[ts(export, export_to = "bindings/")]
pub enum Recommendation {
    /// Book relief capacity: it costs less than the penalty.
    Execute {
        /// Carrier that would provide the relief truck.
        solution_provider: String,
        /// Short description (e.g. "Relief Truck via QuickFreight India").
        solution_type: String,
        /// Cost of the relief truck.
        #[serde(with = "rust_decimal::serde::float")]
        #[ts(as = "f64")]
        solution_cost: Decimal,
        /// Projected penalty minus solution cost (always positive).
        #[serde(with = "rust_decimal::serde::float")]
        #[ts(as = "f64")]
        net_savings: Decimal,
        /// Operational details.
        details: String,
        /// Confidence of the recommendation in `[0, 1]`.
        confidence: f64,
    },
    /// Absorb the penalty: no cheaper alternative exists.
    Wait {
        /// Why no action is recommended.
        reason: String,
    },
}

/// Penalty-versus-relief comparison for a delayed truck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ArbitrageAnalysis {
    /// Truck under analysis.
    pub truck_id: TruckId,
    /// Contract governing the truck's delivery.
    pub contract_id: ContractId,
    /// Penalty that would be paid if nothing is done.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(as = "f64")]
    pub projected_penalty: Decimal,
    /// What to do about it.
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

impl ArbitrageAnalysis {
    /// Build a `WAIT` analysis with the given reason.
    pub fn wait(
        truck_id: TruckId,
        contract_id: ContractId,
        projected_penalty: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            truck_id,
            contract_id,
            projected_penalty,
            recommendation: Recommendation::Wait {
                reason: reason.into(),
            },
        }
    }

    /// Whether the analysis recommends executing the relief booking.
    pub const fn is_execute(&self) -> bool {
        matches!(self.recommendation, Recommendation::Execute { .. })
    }

    /// Net savings of an `EXECUTE` recommendation, `None` for `WAIT`.
    pub const fn net_savings(&self) -> Option<Decimal> {
        match &self.recommendation {
            Recommendation::Execute { net_savings, .. } => Some(*net_savings),
            Recommendation::Wait { .. } => None,
        }
    }
}
