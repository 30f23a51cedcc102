//! The contract analyzer seam.
//!
//! The engine only ever talks to contracts through [`ContractAnalyzer`], so
//! the in-memory book can be swapped for a real contract service without
//! touching the scenario driver or the session handler.

use chainreaction_types::{
    ArbitrageAnalysis, Contract, ContractId, PenaltyAssessment, Recommendation, SpotQuote, TruckId,
};
use rust_decimal::Decimal;

use crate::error::ContractError;

/// Confidence attached to every `EXECUTE` recommendation.
pub const EXECUTE_CONFIDENCE: f64 = 0.95;

/// Reason attached to every `WAIT` recommendation.
pub const WAIT_REASON: &str = "No cost-effective alternative available";

/// Penalty lookup and penalty-versus-relief analysis.
pub trait ContractAnalyzer: Send + Sync {
    /// Look up a contract by id.
    fn get_contract(&self, contract_id: &ContractId) -> Option<Contract>;

    /// Apply the contract's penalty clause to a delay.
    ///
    /// The penalty is `min(penalty_per_hour * delay_hours, max_penalty)`.
    fn calculate_penalty(
        &self,
        contract_id: &ContractId,
        delay_hours: f64,
    ) -> Result<PenaltyAssessment, ContractError>;

    /// Best relief option currently on the spot market.
    fn find_spot_market_solution(&self) -> Result<SpotQuote, ContractError>;

    /// Compare the projected penalty for a delay against the best relief
    /// option and recommend whether to book it.
    fn analyze_arbitrage(
        &self,
        truck_id: &TruckId,
        contract_id: &ContractId,
        delay_hours: f64,
    ) -> Result<ArbitrageAnalysis, ContractError> {
        let penalty = self.calculate_penalty(contract_id, delay_hours)?;
        let quote = self.find_spot_market_solution()?;
        Ok(compare(truck_id, contract_id, penalty.calculated_penalty, &quote))
    }

    /// Human-readable multi-line summary of a contract.
    fn contract_summary(&self, contract_id: &ContractId) -> Option<String>;
}

/// Decide between paying the penalty and booking `quote`.
///
/// Only a strictly positive saving yields `EXECUTE`.
pub fn compare(
    truck_id: &TruckId,
    contract_id: &ContractId,
    projected_penalty: Decimal,
    quote: &SpotQuote,
) -> ArbitrageAnalysis {
    let net_savings = projected_penalty.checked_sub(quote.base_cost);
    match net_savings {
        Some(savings) if savings > Decimal::ZERO => ArbitrageAnalysis {
            truck_id: truck_id.clone(),
            contract_id: contract_id.clone(),
            projected_penalty,
            recommendation: Recommendation::Execute {
                solution_provider: quote.provider.clone(),
                solution_type: format!("Relief Truck via {}", quote.provider),
                solution_cost: quote.base_cost,
                net_savings: savings,
                details: format!("Deploy backup truck - ETA {}", quote.eta),
                confidence: EXECUTE_CONFIDENCE,
            },
        },
        _ => ArbitrageAnalysis::wait(
            truck_id.clone(),
            contract_id.clone(),
            projected_penalty,
            WAIT_REASON,
        ),
    }
}
