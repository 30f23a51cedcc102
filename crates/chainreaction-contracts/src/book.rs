//! In-memory contract book and spot market.

use std::collections::BTreeMap;

use chainreaction_types::{
    Availability, Contract, ContractId, PenaltyAssessment, SpotQuote,
};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::analyzer::ContractAnalyzer;
use crate::error::ContractError;

/// Contracts and spot-market quotes held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContractBook {
    contracts: BTreeMap<ContractId, Contract>,
    spot_market: Vec<SpotQuote>,
}

impl InMemoryContractBook {
    /// Create a book from explicit contracts and quotes.
    pub fn new(contracts: impl IntoIterator<Item = Contract>, spot_market: Vec<SpotQuote>) -> Self {
        Self {
            contracts: contracts.into_iter().map(|c| (c.id.clone(), c)).collect(),
            spot_market,
        }
    }

    /// The demo book: one contract per demo truck and three spot carriers.
    ///
    /// Deadlines are measured from `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let contracts = [
            contract(
                "CNT-2024-001",
                "TechCorp India Pvt Ltd",
                "Pune to Mumbai",
                120_000,
                deadline(now, 3),
                500,
                2500,
                "Delivery must be completed within 3 hours. Penalty of $500/hour for delays up to 5 hours. Maximum penalty capped at $2,500.",
            ),
            contract(
                "CNT-2024-002",
                "PharmaCare Ltd",
                "Bangalore to Hyderabad",
                85_000,
                deadline(now, 4),
                400,
                2000,
                "Temperature-controlled delivery within 4 hours. $400/hour penalty for delays.",
            ),
            contract(
                "CNT-2024-003",
                "AutoParts Express",
                "Kolkata to Bhubaneswar",
                95_000,
                deadline(now, 5),
                350,
                1750,
                "Standard delivery in 5 hours. $350/hour penalty applies.",
            ),
        ];
        let spot_market = vec![
            quote("QuickFreight India", 800, "45 minutes", Availability::High),
            quote("RapidLogistics", 950, "30 minutes", Availability::Medium),
            quote("ExpressHaul Services", 1100, "20 minutes", Availability::Low),
        ];
        Self::new(contracts, spot_market)
    }

    /// Number of contracts on the books.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether the book holds no contracts.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl ContractAnalyzer for InMemoryContractBook {
    fn get_contract(&self, contract_id: &ContractId) -> Option<Contract> {
        self.contracts.get(contract_id).cloned()
    }

    fn calculate_penalty(
        &self,
        contract_id: &ContractId,
        delay_hours: f64,
    ) -> Result<PenaltyAssessment, ContractError> {
        let contract = self
            .contracts
            .get(contract_id)
            .ok_or_else(|| ContractError::NotFound(contract_id.clone()))?;

        if !delay_hours.is_finite() || delay_hours < 0.0 {
            return Err(ContractError::InvalidDelay(delay_hours.to_string()));
        }
        // A delay beyond Decimal's range, or an overflowing product, is
        // certainly above the cap.
        let calculated_penalty = Decimal::try_from(delay_hours)
            .ok()
            .and_then(|hours| contract.penalty_per_hour.checked_mul(hours))
            .map_or(contract.max_penalty, |raw| raw.min(contract.max_penalty));

        debug!(
            contract_id = %contract_id,
            delay_hours,
            penalty = %calculated_penalty,
            "Penalty calculated"
        );

        Ok(PenaltyAssessment {
            contract_id: contract_id.clone(),
            delay_hours,
            penalty_per_hour: contract.penalty_per_hour,
            calculated_penalty,
            max_penalty: contract.max_penalty,
            terms: contract.terms.clone(),
        })
    }

    fn find_spot_market_solution(&self) -> Result<SpotQuote, ContractError> {
        self.spot_market
            .iter()
            .min_by_key(|q| q.base_cost)
            .cloned()
            .ok_or(ContractError::NoSpotCapacity)
    }

    fn contract_summary(&self, contract_id: &ContractId) -> Option<String> {
        let c = self.contracts.get(contract_id)?;
        Some(format!(
            "Contract: {}\n\
             Client: {}\n\
             Route: {}\n\
             Cargo Value: ${}\n\
             Deadline: {}\n\
             Penalty: ${}/hour (max ${})\n\
             Terms: {}",
            c.id,
            c.client,
            c.route,
            group_thousands(c.cargo_value),
            c.delivery_deadline.to_rfc3339(),
            c.penalty_per_hour.normalize(),
            c.max_penalty.normalize(),
            c.terms,
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn contract(
    id: &str,
    client: &str,
    route: &str,
    cargo_value: u64,
    delivery_deadline: DateTime<Utc>,
    penalty_per_hour: i64,
    max_penalty: i64,
    terms: &str,
) -> Contract {
    Contract {
        id: ContractId::new(id),
        client: client.to_owned(),
        route: route.to_owned(),
        cargo_value,
        delivery_deadline,
        penalty_per_hour: Decimal::from(penalty_per_hour),
        max_penalty: Decimal::from(max_penalty),
        terms: terms.to_owned(),
    }
}

fn quote(provider: &str, base_cost: i64, eta: &str, availability: Availability) -> SpotQuote {
    SpotQuote {
        provider: provider.to_owned(),
        base_cost: Decimal::from(base_cost),
        eta: eta.to_owned(),
        availability,
    }
}

fn deadline(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    TimeDelta::try_hours(hours)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}

/// Render `120000` as `120,000`.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len().saturating_add(digits.len() / 3));
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len().saturating_sub(i)) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use chainreaction_types::{Recommendation, TruckId};
    use rust_decimal_macros::dec;

    use super::*;

    fn book() -> InMemoryContractBook {
        InMemoryContractBook::demo(Utc::now())
    }

    fn cnt(id: &str) -> ContractId {
        ContractId::new(id)
    }

    #[test]
    fn demo_book_has_three_contracts() {
        let book = book();
        assert_eq!(book.len(), 3);
        let c = book.get_contract(&cnt("CNT-2024-002")).unwrap();
        assert_eq!(c.client, "PharmaCare Ltd");
        assert_eq!(c.penalty_per_hour, dec!(400));
        assert!(book.get_contract(&cnt("CNT-404")).is_none());
    }

    #[test]
    fn penalty_is_hourly_rate_times_delay() {
        let assessment = book()
            .calculate_penalty(&cnt("CNT-2024-001"), 2.5)
            .unwrap();
        assert_eq!(assessment.calculated_penalty, dec!(1250));
        assert_eq!(assessment.max_penalty, dec!(2500));
    }

    #[test]
    fn penalty_is_capped() {
        let assessment = book()
            .calculate_penalty(&cnt("CNT-2024-001"), 10.0)
            .unwrap();
        assert_eq!(assessment.calculated_penalty, dec!(2500));
    }

    #[test]
    fn delay_beyond_decimal_range_saturates_at_cap() {
        let book = book();
        for delay in [1e20, 1e30, f64::MAX] {
            let assessment = book
                .calculate_penalty(&cnt("CNT-2024-001"), delay)
                .unwrap();
            assert_eq!(assessment.calculated_penalty, dec!(2500));
        }
    }

    #[test]
    fn zero_delay_costs_nothing() {
        let assessment = book()
            .calculate_penalty(&cnt("CNT-2024-003"), 0.0)
            .unwrap();
        assert_eq!(assessment.calculated_penalty, Decimal::ZERO);
    }

    #[test]
    fn penalty_for_unknown_contract_is_not_found() {
        let err = book().calculate_penalty(&cnt("CNT-404"), 1.0).unwrap_err();
        assert_eq!(err, ContractError::NotFound(cnt("CNT-404")));
    }

    #[test]
    fn negative_or_nan_delay_is_rejected() {
        let book = book();
        assert!(matches!(
            book.calculate_penalty(&cnt("CNT-2024-001"), -1.0),
            Err(ContractError::InvalidDelay(_))
        ));
        assert!(matches!(
            book.calculate_penalty(&cnt("CNT-2024-001"), f64::NAN),
            Err(ContractError::InvalidDelay(_))
        ));
    }

    #[test]
    fn cheapest_spot_quote_wins() {
        let quote = book().find_spot_market_solution().unwrap();
        assert_eq!(quote.provider, "QuickFreight India");
        assert_eq!(quote.base_cost, dec!(800));
    }

    #[test]
    fn empty_spot_market_is_an_error() {
        let book = InMemoryContractBook::new(Vec::new(), Vec::new());
        assert_eq!(
            book.find_spot_market_solution().unwrap_err(),
            ContractError::NoSpotCapacity
        );
    }

    #[test]
    fn large_penalty_recommends_execute() {
        let analysis = book()
            .analyze_arbitrage(&TruckId::new("TRK-402"), &cnt("CNT-2024-001"), 2.5)
            .unwrap();
        assert_eq!(analysis.projected_penalty, dec!(1250));
        match analysis.recommendation {
            Recommendation::Execute {
                solution_type,
                solution_cost,
                net_savings,
                details,
                ..
            } => {
                assert_eq!(solution_type, "Relief Truck via QuickFreight India");
                assert_eq!(solution_cost, dec!(800));
                assert_eq!(net_savings, dec!(450));
                assert_eq!(details, "Deploy backup truck - ETA 45 minutes");
            }
            Recommendation::Wait { .. } => panic!("expected EXECUTE"),
        }
    }

    #[test]
    fn small_penalty_recommends_wait() {
        // 350 * 2 = 700 < 800
        let analysis = book()
            .analyze_arbitrage(&TruckId::new("TRK-518"), &cnt("CNT-2024-003"), 2.0)
            .unwrap();
        assert!(!analysis.is_execute());
        assert_eq!(analysis.net_savings(), None);
    }

    #[test]
    fn break_even_recommends_wait() {
        // 400 * 2 = 800 == 800
        let analysis = book()
            .analyze_arbitrage(&TruckId::new("TRK-305"), &cnt("CNT-2024-002"), 2.0)
            .unwrap();
        assert!(!analysis.is_execute());
    }

    #[test]
    fn summary_lists_contract_fields() {
        let summary = book().contract_summary(&cnt("CNT-2024-001")).unwrap();
        assert!(summary.starts_with("Contract: CNT-2024-001\n"));
        assert!(summary.contains("Client: TechCorp India Pvt Ltd"));
        assert!(summary.contains("Cargo Value: $120,000"));
        assert!(summary.contains("Penalty: $500/hour (max $2500)"));
        assert!(summary.ends_with("Maximum penalty capped at $2,500."));
        assert_eq!(summary.lines().count(), 7);
        assert!(book().contract_summary(&cnt("CNT-404")).is_none());
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
