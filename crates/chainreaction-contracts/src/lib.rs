//! Contract collaborator for the ChainReaction engine.
//!
//! Answers three questions about a delivery contract: what does it say,
//! what would a delay cost, and is booking relief capacity cheaper than
//! paying the penalty. [`ContractAnalyzer`] is the seam the rest of the
//! engine depends on; [`InMemoryContractBook`] is the built-in
//! implementation.

pub mod analyzer;
pub mod book;
pub mod error;

pub use analyzer::{ContractAnalyzer, EXECUTE_CONFIDENCE, WAIT_REASON, compare};
pub use book::InMemoryContractBook;
pub use error::ContractError;
