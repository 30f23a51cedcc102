//! Error types for the `chainreaction-contracts` crate.

use chainreaction_types::ContractId;

/// Errors returned by a [`crate::ContractAnalyzer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// No contract with this id is on the books.
    #[error("contract not found: {0}")]
    NotFound(ContractId),

    /// The delay is negative or not a finite number.
    #[error("invalid delay: {0} hours")]
    InvalidDelay(String),

    /// The spot market has no carriers to quote.
    #[error("no spot market capacity available")]
    NoSpotCapacity,
}
