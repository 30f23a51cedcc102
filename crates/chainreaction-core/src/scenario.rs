//! Scenario driver: timed, one-shot disruptions injected into the fleet.
//!
//! A scenario pairs a due time (relative to the first tick) with a tagged
//! [`ScenarioAction`]. The driver runs every pending scenario whose due time
//! has been reached, in due-time order with ties broken by registration
//! order, and never runs a scenario twice.

use std::time::Duration;

use chainreaction_contracts::ContractAnalyzer;
use chainreaction_fleet::FleetState;
use chainreaction_types::{
    ArbitrageAnalysis, ContractId, DelaySeverity, EventKind, TruckId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What a scenario does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    /// Disrupt a truck.
    ApplyDelay {
        /// Truck to disrupt.
        truck_id: TruckId,
        /// How badly.
        #[serde(default)]
        severity: DelaySeverity,
    },
    /// Return a truck to normal operation.
    ResolveDelay {
        /// Truck to recover.
        truck_id: TruckId,
    },
    /// Append an informational event.
    RecordEvent {
        /// Event category.
        kind: EventKind,
        /// Event text.
        message: String,
        /// Truck the event refers to.
        #[serde(default)]
        truck_id: Option<TruckId>,
    },
    /// Ask the contract analyzer whether relief capacity beats the penalty.
    AnalyzeArbitrage {
        /// Delayed truck.
        truck_id: TruckId,
        /// Contract to evaluate.
        contract_id: ContractId,
        /// Projected delay in hours.
        delay_hours: f64,
    },
}

/// A scenario as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Seconds after the first tick at which the scenario becomes due.
    pub at_seconds: u64,
    /// What to do.
    pub action: ScenarioAction,
}

/// Something a fired scenario wants broadcast beyond the next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioNotice {
    /// An analysis recommended booking relief capacity.
    ArbitrageOpportunity(ArbitrageAnalysis),
}

/// A registered scenario and whether it has fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// When the scenario becomes due.
    pub due: Duration,
    /// What it does.
    pub action: ScenarioAction,
    /// Set before the action is applied; never cleared.
    pub executed: bool,
}

/// Ordered set of one-shot scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioDriver {
    /// Sorted by `due`; equal due times keep registration order.
    scenarios: Vec<Scenario>,
}

impl ScenarioDriver {
    /// Create a driver with no scenarios.
    pub const fn new() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    /// Create a driver from configuration entries.
    pub fn from_specs(specs: &[ScenarioSpec]) -> Self {
        let mut driver = Self::new();
        for spec in specs {
            driver.schedule(Duration::from_secs(spec.at_seconds), spec.action.clone());
        }
        driver
    }

    /// Register a one-shot action due at `due` after the first tick.
    pub fn schedule(&mut self, due: Duration, action: ScenarioAction) {
        let pos = self.scenarios.partition_point(|s| s.due <= due);
        self.scenarios.insert(
            pos,
            Scenario {
                due,
                action,
                executed: false,
            },
        );
    }

    /// Fire every pending scenario due at or before `elapsed`.
    ///
    /// Each scenario is marked executed before its action is applied, so a
    /// failing action is never retried. Returns the notices produced.
    pub fn run(
        &mut self,
        elapsed: Duration,
        fleet: &mut FleetState,
        analyzer: &dyn ContractAnalyzer,
    ) -> Vec<ScenarioNotice> {
        let mut notices = Vec::new();
        for scenario in &mut self.scenarios {
            if scenario.due > elapsed {
                break;
            }
            if scenario.executed {
                continue;
            }
            scenario.executed = true;
            debug!(due_ms = scenario.due.as_millis(), action = ?scenario.action, "Scenario fired");
            if let Some(notice) = apply(&scenario.action, fleet, analyzer) {
                notices.push(notice);
            }
        }
        notices
    }

    /// Number of scenarios that have not fired yet.
    pub fn pending(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.executed).count()
    }

    /// Total number of registered scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether no scenarios are registered.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Registered scenarios in firing order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }
}

fn apply(
    action: &ScenarioAction,
    fleet: &mut FleetState,
    analyzer: &dyn ContractAnalyzer,
) -> Option<ScenarioNotice> {
    match action {
        ScenarioAction::ApplyDelay { truck_id, severity } => {
            if !fleet.apply_delay(truck_id, *severity) {
                warn!(truck_id = %truck_id, "Scenario targets unknown truck");
            }
            None
        }
        ScenarioAction::ResolveDelay { truck_id } => {
            if !fleet.resolve_delay(truck_id) {
                warn!(truck_id = %truck_id, "Scenario targets unknown truck");
            }
            None
        }
        ScenarioAction::RecordEvent {
            kind,
            message,
            truck_id,
        } => {
            fleet.record_event(kind.clone(), message.clone(), truck_id.clone());
            None
        }
        ScenarioAction::AnalyzeArbitrage {
            truck_id,
            contract_id,
            delay_hours,
        } => analyze(truck_id, contract_id, *delay_hours, fleet, analyzer),
    }
}

fn analyze(
    truck_id: &TruckId,
    contract_id: &ContractId,
    delay_hours: f64,
    fleet: &mut FleetState,
    analyzer: &dyn ContractAnalyzer,
) -> Option<ScenarioNotice> {
    let analysis = analyzer
        .analyze_arbitrage(truck_id, contract_id, delay_hours)
        .unwrap_or_else(|err| {
            warn!(truck_id = %truck_id, contract_id = %contract_id, error = %err, "Arbitrage analysis failed");
            ArbitrageAnalysis::wait(
                truck_id.clone(),
                contract_id.clone(),
                Decimal::ZERO,
                err.to_string(),
            )
        });

    let Some(savings) = analysis.net_savings() else {
        info!(truck_id = %truck_id, "Arbitrage analysis recommends waiting");
        return None;
    };

    info!(truck_id = %truck_id, net_savings = %savings, "Arbitrage opportunity detected");
    fleet.record_event(
        EventKind::Arbitrage,
        format!("ARBITRAGE OPPORTUNITY - Net Savings: ${}", savings.normalize()),
        Some(truck_id.clone()),
    );
    Some(ScenarioNotice::ArbitrageOpportunity(analysis))
}

/// The demo choreography.
///
/// | At | Action |
/// |----|--------|
/// | 0s | system event announcing the agent |
/// | 5s | critical delay on TRK-402 |
/// | 8s | SLA alert for TRK-402 |
/// | 12s | arbitrage analysis for TRK-402 under CNT-2024-001, 2.5h delay |
pub fn demo_script() -> Vec<ScenarioSpec> {
    let trk = || TruckId::new("TRK-402");
    vec![
        ScenarioSpec {
            at_seconds: 0,
            action: ScenarioAction::RecordEvent {
                kind: EventKind::System,
                message: String::from("Supply Chain Agent initialized"),
                truck_id: None,
            },
        },
        ScenarioSpec {
            at_seconds: 5,
            action: ScenarioAction::ApplyDelay {
                truck_id: trk(),
                severity: DelaySeverity::Critical,
            },
        },
        ScenarioSpec {
            at_seconds: 8,
            action: ScenarioAction::RecordEvent {
                kind: EventKind::Alert,
                message: String::from("TRK-402 CRITICAL - SLA threshold exceeded"),
                truck_id: Some(trk()),
            },
        },
        ScenarioSpec {
            at_seconds: 12,
            action: ScenarioAction::AnalyzeArbitrage {
                truck_id: trk(),
                contract_id: ContractId::new("CNT-2024-001"),
                delay_hours: 2.5,
            },
        },
    ]
}
