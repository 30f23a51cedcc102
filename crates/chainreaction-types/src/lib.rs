//! Shared type definitions for the ChainReaction fleet broadcast engine.
//!
//! This crate is the single source of truth for the data model and the
//! wire protocol. Types flow downstream to `TypeScript` via `ts-rs` for the
//! dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier wrappers (trucks, contracts, events)
//! - [`enums`] -- Status, severity and event-kind enumerations
//! - [`structs`] -- Trucks, events and broadcast snapshots
//! - [`contract`] -- Contract, penalty and arbitrage records
//! - [`protocol`] -- WebSocket messages in both directions

pub mod contract;
pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use contract::{ArbitrageAnalysis, Contract, PenaltyAssessment, Recommendation, SpotQuote};
pub use enums::{Availability, DelaySeverity, EventKind, Severity, TruckStatus};
pub use ids::{ContractId, EventId, InvalidEventId, TruckId};
pub use protocol::{ClientCommand, ServerMessage};
pub use structs::{Coordinate, Event, Snapshot, Truck};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Exporting writes the `.ts` files into `bindings/` relative to the
        // crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::TruckId::export_all();
        let _ = crate::ids::ContractId::export_all();

        // Enums
        let _ = crate::enums::TruckStatus::export_all();
        let _ = crate::enums::DelaySeverity::export_all();
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::Availability::export_all();

        // Structs
        let _ = crate::structs::Coordinate::export_all();
        let _ = crate::structs::Truck::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::Snapshot::export_all();

        // Contracts
        let _ = crate::contract::Contract::export_all();
        let _ = crate::contract::PenaltyAssessment::export_all();
        let _ = crate::contract::SpotQuote::export_all();
        let _ = crate::contract::Recommendation::export_all();
        let _ = crate::contract::ArbitrageAnalysis::export_all();

        // Protocol
        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::ClientCommand::export_all();
    }
}
