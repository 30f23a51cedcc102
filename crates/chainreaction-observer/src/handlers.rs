//! REST endpoint handlers for the observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/status` | Minimal HTML status page |
//! | `GET` | `/api/health` | Loop phase, tick count, observer count |
//! | `GET` | `/api/state` | Current fleet snapshot |
//! | `GET` | `/api/contracts/{id}` | Single contract |
//! | `GET` | `/api/contracts/{id}/penalty` | Penalty for `?delay_hours=` |
//! | `GET` | `/api/contracts/{id}/summary` | Plain-text contract summary |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use chainreaction_contracts::ContractError;
use chainreaction_core::status::LoopPhase;
use chainreaction_types::{ContractId, TruckStatus};

use crate::error::ObserverError;
use crate::state::AppState;

/// Query parameters for `GET /api/contracts/{id}/penalty`.
#[derive(Debug, serde::Deserialize)]
pub struct PenaltyQuery {
    /// Delay to price, in hours.
    pub delay_hours: Option<f64>,
}

/// Serve a minimal HTML page with live counters and endpoint links.
pub async fn status_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (trucks, delayed, events) = state.fleet.read(|fleet| {
        let delayed = fleet
            .trucks()
            .iter()
            .filter(|t| matches!(t.status, TruckStatus::Delayed | TruckStatus::Critical))
            .count();
        (fleet.trucks().len(), delayed, fleet.event_count())
    });
    let phase = match state.loop_status.phase() {
        LoopPhase::Waiting => "WAITING",
        LoopPhase::Ticking => "TICKING",
    };
    let ticks = state.loop_status.ticks();
    let connections = state.registry.len();
    let uptime = state.uptime_seconds();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>ChainReaction Broadcast</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>ChainReaction Broadcast</h1>
    <p class="subtitle">Fleet state stream over WebSocket at <code>/ws</code></p>

    <p>Loop: <span class="status">{phase}</span> (uptime {uptime}s)</p>

    <div>
        <div class="metric"><div class="label">Ticks</div><div class="value">{ticks}</div></div>
        <div class="metric"><div class="label">Observers</div><div class="value">{connections}</div></div>
        <div class="metric"><div class="label">Trucks</div><div class="value">{trucks}</div></div>
        <div class="metric"><div class="label">Delayed</div><div class="value">{delayed}</div></div>
        <div class="metric"><div class="label">Events</div><div class="value">{events}</div></div>
    </div>

    <ul>
        <li><a href="/api/health">/api/health</a></li>
        <li><a href="/api/state">/api/state</a></li>
        <li><a href="/api/contracts/CNT-2024-001">/api/contracts/CNT-2024-001</a></li>
    </ul>
</body>
</html>"#
    ))
}

/// Liveness plus broadcast loop counters.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "phase": state.loop_status.phase(),
        "ticks": state.loop_status.ticks(),
        "broadcasts": state.loop_status.broadcasts(),
        "connections": state.registry.len(),
        "uptimeSeconds": state.uptime_seconds(),
    }))
}

/// The same snapshot an observer would receive as `initial_state`.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.fleet.snapshot();
    Ok(Json(serde_json::to_value(snapshot)?))
}

/// Look up a single contract.
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let contract_id = ContractId::new(id);
    let contract = state
        .analyzer
        .get_contract(&contract_id)
        .ok_or_else(|| ObserverError::NotFound(format!("contract {contract_id}")))?;
    Ok(Json(serde_json::to_value(contract)?))
}

/// Price a delay against a contract's penalty clause.
///
/// # Query Parameters
///
/// - `delay_hours` -- required, finite and non-negative.
pub async fn get_penalty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PenaltyQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let delay_hours = params
        .delay_hours
        .ok_or_else(|| ObserverError::InvalidQuery(String::from("delay_hours is required")))?;

    let contract_id = ContractId::new(id);
    let assessment = state
        .analyzer
        .calculate_penalty(&contract_id, delay_hours)
        .map_err(|e| match e {
            ContractError::NotFound(id) => ObserverError::NotFound(format!("contract {id}")),
            other => ObserverError::InvalidQuery(other.to_string()),
        })?;
    Ok(Json(serde_json::to_value(assessment)?))
}

/// Human-readable contract summary as plain text.
pub async fn get_contract_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let contract_id = ContractId::new(id);
    state
        .analyzer
        .contract_summary(&contract_id)
        .ok_or_else(|| ObserverError::NotFound(format!("contract {contract_id}")))
}
