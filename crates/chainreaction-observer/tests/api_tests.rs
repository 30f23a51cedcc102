//! Integration tests for the observer REST endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chainreaction_contracts::InMemoryContractBook;
use chainreaction_fleet::{FleetHandle, FleetParams, FleetState, default_manifest};
use chainreaction_observer::router::build_router;
use chainreaction_observer::state::AppState;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let params = FleetParams {
        seed: Some(42),
        ..FleetParams::default()
    };
    let fleet = FleetState::from_manifest(&default_manifest(), params).unwrap();
    let book = InMemoryContractBook::demo(Utc::now());
    Arc::new(AppState::new(FleetHandle::new(fleet), Arc::new(book)).with_max_connections(1))
}

async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_waiting_loop_and_no_observers() {
    let resp = get(make_test_state(), "/api/health").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["phase"], "waiting");
    assert_eq!(json["ticks"], 0);
    assert_eq!(json["connections"], 0);
}

#[tokio::test]
async fn state_endpoint_serves_snapshot_shape() {
    let state = make_test_state();
    state.fleet.advance();
    let resp = get(state, "/api/state").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_to_json(resp.into_body()).await;
    let trucks = json["trucks"].as_array().unwrap();
    assert_eq!(trucks.len(), 3);
    assert_eq!(trucks[0]["id"], "TRK-402");
    assert_eq!(trucks[0]["currentRouteIndex"], 1);
    assert_eq!(trucks[0]["position"].as_array().unwrap().len(), 2);
    assert!(json["events"].is_array());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn known_contract_is_returned() {
    let resp = get(make_test_state(), "/api/contracts/CNT-2024-001").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["id"], "CNT-2024-001");
    assert_eq!(json["penaltyPerHour"], 500.0);
}

#[tokio::test]
async fn unknown_contract_is_404_with_json_error() {
    let resp = get(make_test_state(), "/api/contracts/CNT-404").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("CNT-404"));
}

#[tokio::test]
async fn penalty_is_capped_at_max() {
    let state = make_test_state();

    let resp = get(
        Arc::clone(&state),
        "/api/contracts/CNT-2024-001/penalty?delay_hours=2.5",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["calculatedPenalty"], 1250.0);

    let resp = get(
        Arc::clone(&state),
        "/api/contracts/CNT-2024-001/penalty?delay_hours=10",
    )
    .await;
    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["calculatedPenalty"], 2500.0);

    let resp = get(state, "/api/contracts/CNT-2024-001/penalty?delay_hours=1e30").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["calculatedPenalty"], 2500.0);
}

#[tokio::test]
async fn penalty_requires_valid_delay() {
    let state = make_test_state();

    let resp = get(Arc::clone(&state), "/api/contracts/CNT-2024-001/penalty").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = get(state, "/api/contracts/CNT-2024-001/penalty?delay_hours=-1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_is_plain_text() {
    let resp = get(make_test_state(), "/api/contracts/CNT-2024-001/summary").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_to_string(resp.into_body()).await;
    assert!(text.starts_with("Contract: CNT-2024-001"));
}

#[tokio::test]
async fn status_page_is_html() {
    let resp = get(make_test_state(), "/status").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_to_string(resp.into_body()).await;
    assert!(html.contains("ChainReaction Broadcast"));
    assert!(html.contains("WAITING"));
}

#[tokio::test]
async fn websocket_route_rejects_plain_http() {
    let resp = get(make_test_state(), "/ws").await;
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn websocket_route_rejects_when_full() {
    let state = make_test_state();
    let _held = state.limiter.try_acquire().unwrap();

    let resp = get(state, "/ws").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(resp.into_body()).await;
    assert_eq!(json["status"], 503);
}
