//! WebSocket wire protocol.
//!
//! Every frame is a JSON object with a `type` tag. [`ServerMessage`] covers
//! everything the server pushes; [`ClientCommand`] covers what observers
//! may send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::contract::{ArbitrageAnalysis, Contract};
use crate::ids::{ContractId, TruckId};
use crate::structs::Snapshot;

/// A message pushed from the server to one or all observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Full snapshot sent once to a newly connected observer.
    InitialState {
        /// The snapshot.
        data: Snapshot,
    },
    /// Snapshot broadcast on every tick and after state-changing commands.
    StateUpdate {
        /// The snapshot.
        data: Snapshot,
    },
    /// A scripted arbitrage analysis recommended action.
    ArbitrageOpportunity {
        /// The analysis.
        data: ArbitrageAnalysis,
    },
    /// An observer executed arbitrage for a truck.
    ArbitrageExecuted {
        /// Truck whose delay was resolved.
        truck_id: TruckId,
        /// When the command was executed.
        timestamp: DateTime<Utc>,
    },
    /// Reply to `request_contract`; `null` when the contract is unknown.
    ContractData {
        /// The contract, if found.
        data: Option<Contract>,
    },
    /// Reply to `ping`.
    Pong {
        /// Server time when the ping was handled.
        timestamp: DateTime<Utc>,
    },
    /// The last client frame could not be handled.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl ServerMessage {
    /// Build an error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Return the wire `type` tag of the message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InitialState { .. } => "initial_state",
            Self::StateUpdate { .. } => "state_update",
            Self::ArbitrageOpportunity { .. } => "arbitrage_opportunity",
            Self::ArbitrageExecuted { .. } => "arbitrage_executed",
            Self::ContractData { .. } => "contract_data",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }
}

/// A command sent by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientCommand {
    /// Resolve a truck's delay by booking relief capacity.
    ExecuteArbitrage {
        /// Truck to resolve.
        truck_id: TruckId,
    },
    /// Fetch a contract record.
    RequestContract {
        /// Contract to fetch.
        contract_id: ContractId,
    },
    /// Liveness probe.
    Ping,
}
