//! Session pipeline tests: admission, command dispatch and fan-out,
//! exercised through the outbound queues without a socket.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chainreaction_contracts::InMemoryContractBook;
use chainreaction_fleet::{FleetHandle, FleetParams, FleetState, default_manifest};
use chainreaction_observer::registry::{ConnectionHandle, Frame};
use chainreaction_observer::session::{self, BINARY_UNSUPPORTED, INVALID_JSON, Session};
use chainreaction_observer::state::AppState;
use chainreaction_types::{DelaySeverity, TruckId, TruckStatus};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

fn make_state() -> AppState {
    let params = FleetParams {
        seed: Some(7),
        ..FleetParams::default()
    };
    let fleet = FleetState::from_manifest(&default_manifest(), params).unwrap();
    let book = InMemoryContractBook::demo(Utc::now());
    AppState::new(FleetHandle::new(fleet), Arc::new(book)).with_queue_capacity(16)
}

fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(serde_json::from_str(&frame).unwrap());
    }
    out
}

fn types(frames: &[Value]) -> Vec<&str> {
    frames.iter().map(|f| f["type"].as_str().unwrap()).collect()
}

#[test]
fn initial_state_is_first_frame() {
    let state = make_state();
    let mut session = session::open(&state).unwrap();
    assert!(state.registry.contains(session.id));

    let frames = drain(&mut session.outbound);
    assert_eq!(types(&frames), ["initial_state"]);
    assert_eq!(frames[0]["data"]["trucks"].as_array().unwrap().len(), 3);
}

#[test]
fn late_joiner_sees_prior_mutations() {
    let state = make_state();
    for _ in 0..5 {
        state.fleet.advance();
    }
    state
        .fleet
        .apply_delay(&TruckId::new("TRK-402"), DelaySeverity::Critical);

    let mut session = session::open(&state).unwrap();
    let frames = drain(&mut session.outbound);
    let trucks = frames[0]["data"]["trucks"].as_array().unwrap();
    let trk = trucks.iter().find(|t| t["id"] == "TRK-402").unwrap();
    assert_eq!(trk["status"], "critical");
    assert_eq!(trk["velocity"], 0);
    assert_eq!(trk["currentRouteIndex"], 5);
}

#[test]
fn dropping_guard_unregisters_once() {
    let state = make_state();
    let Session { id, guard, .. } = session::open(&state).unwrap();
    assert_eq!(state.registry.len(), 1);

    drop(guard);
    assert!(!state.registry.contains(id));
    assert!(!state.registry.unregister(id));
}

#[test]
fn ping_gets_pong_for_requester_only() {
    let state = make_state();
    let mut a = session::open(&state).unwrap();
    let mut b = session::open(&state).unwrap();
    drain(&mut a.outbound);
    drain(&mut b.outbound);

    session::dispatch(&state, a.id, r#"{"type":"ping"}"#);

    let frames = drain(&mut a.outbound);
    assert_eq!(types(&frames), ["pong"]);
    assert!(frames[0]["timestamp"].is_string());
    assert!(drain(&mut b.outbound).is_empty());
}

#[test]
fn malformed_frames_get_error_replies() {
    let state = make_state();
    let mut s = session::open(&state).unwrap();
    drain(&mut s.outbound);

    session::dispatch(&state, s.id, "{{nope");
    session::dispatch(&state, s.id, r#"{"type":"teleport"}"#);
    session::dispatch(&state, s.id, r#"{"type":"execute_arbitrage"}"#);
    session::reject_binary(&state, s.id);

    let frames = drain(&mut s.outbound);
    assert_eq!(types(&frames), ["error", "error", "error", "error"]);
    assert_eq!(frames[0]["message"], INVALID_JSON);
    assert_eq!(frames[1]["message"], "Unknown message type: teleport");
    assert_eq!(frames[3]["message"], BINARY_UNSUPPORTED);
    assert!(state.registry.contains(s.id));
}

#[test]
fn request_contract_replies_with_data_or_null() {
    let state = make_state();
    let mut s = session::open(&state).unwrap();
    drain(&mut s.outbound);

    session::dispatch(
        &state,
        s.id,
        r#"{"type":"request_contract","contractId":"CNT-2024-002"}"#,
    );
    session::dispatch(
        &state,
        s.id,
        r#"{"type":"request_contract","contractId":"CNT-404"}"#,
    );

    let frames = drain(&mut s.outbound);
    assert_eq!(types(&frames), ["contract_data", "contract_data"]);
    assert_eq!(frames[0]["data"]["id"], "CNT-2024-002");
    assert!(frames[1]["data"].is_null());
}

#[test]
fn execute_arbitrage_resolves_and_broadcasts_to_all() {
    let state = make_state();
    let trk = TruckId::new("TRK-402");
    state.fleet.apply_delay(&trk, DelaySeverity::Critical);

    let mut a = session::open(&state).unwrap();
    let mut b = session::open(&state).unwrap();
    drain(&mut a.outbound);
    drain(&mut b.outbound);

    session::dispatch(
        &state,
        a.id,
        r#"{"type":"execute_arbitrage","truckId":"TRK-402"}"#,
    );

    let truck = state.fleet.truck(&trk).unwrap();
    assert_eq!(truck.status, TruckStatus::OnTime);
    assert!((60..=75).contains(&truck.velocity));

    for rx in [&mut a.outbound, &mut b.outbound] {
        let frames = drain(rx);
        assert_eq!(types(&frames), ["arbitrage_executed", "state_update"]);
        assert_eq!(frames[0]["truckId"], "TRK-402");
        let events = frames[1]["data"]["events"].as_array().unwrap();
        assert_eq!(
            events.last().unwrap()["message"],
            "Arbitrage executed for TRK-402"
        );
    }
}

#[test]
fn execute_arbitrage_on_unknown_truck_errors_to_requester_only() {
    let state = make_state();
    let mut a = session::open(&state).unwrap();
    let mut b = session::open(&state).unwrap();
    drain(&mut a.outbound);
    drain(&mut b.outbound);
    let events_before = state.fleet.read(FleetState::event_count);

    session::dispatch(
        &state,
        a.id,
        r#"{"type":"execute_arbitrage","truckId":"TRK-999"}"#,
    );

    let frames = drain(&mut a.outbound);
    assert_eq!(types(&frames), ["error"]);
    assert_eq!(frames[0]["message"], "Unknown truck: TRK-999");
    assert!(drain(&mut b.outbound).is_empty());
    assert_eq!(state.fleet.read(FleetState::event_count), events_before);
}

#[test]
fn slow_observer_is_evicted_and_others_keep_receiving() {
    let state = make_state();
    let mut fast = session::open(&state).unwrap();
    drain(&mut fast.outbound);

    let slow = state.registry.next_id();
    let (handle, _slow_rx) = ConnectionHandle::channel(slow, 1);
    state.registry.register(handle);

    session::dispatch(
        &state,
        fast.id,
        r#"{"type":"execute_arbitrage","truckId":"TRK-305"}"#,
    );

    assert!(!state.registry.contains(slow));
    assert!(state.registry.contains(fast.id));
    assert_eq!(
        types(&drain(&mut fast.outbound)),
        ["arbitrage_executed", "state_update"]
    );
}
