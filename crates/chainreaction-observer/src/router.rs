//! Axum router construction for the observer server.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /` and `GET /ws` -- observer `WebSocket`
/// - `GET /status` -- HTML status page
/// - `GET /api/health` -- loop and connection counters
/// - `GET /api/state` -- current snapshot
/// - `GET /api/contracts/{id}` -- single contract
/// - `GET /api/contracts/{id}/penalty?delay_hours=` -- penalty for a delay
/// - `GET /api/contracts/{id}/summary` -- plain-text summary
///
/// CORS allows any origin so a dashboard on another port can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ws::ws_observer))
        .route("/ws", get(ws::ws_observer))
        .route("/status", get(handlers::status_page))
        .route("/api/health", get(handlers::health))
        .route("/api/state", get(handlers::get_state))
        .route("/api/contracts/{id}", get(handlers::get_contract))
        .route("/api/contracts/{id}/penalty", get(handlers::get_penalty))
        .route("/api/contracts/{id}/summary", get(handlers::get_contract_summary))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
