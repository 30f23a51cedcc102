//! Error types for the `chainreaction-fleet` crate.
//!
//! Only fleet construction is fallible. Mutations on unknown trucks are
//! soft no-ops reported through their return values.

use chainreaction_types::TruckId;

/// Errors raised while building a fleet from a manifest.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// A manifest entry has an empty truck id.
    #[error("manifest entry {index} has an empty truck id")]
    EmptyTruckId {
        /// Position of the offending entry in the manifest.
        index: usize,
    },

    /// Two manifest entries share the same truck id.
    #[error("duplicate truck id in manifest: {0}")]
    DuplicateTruck(TruckId),

    /// A truck was given a route without waypoints.
    #[error("truck {0} has an empty route")]
    EmptyRoute(TruckId),

    /// Fleet parameters are out of range.
    #[error("invalid fleet parameters: {reason}")]
    InvalidParams {
        /// Explanation of what is wrong.
        reason: String,
    },
}
