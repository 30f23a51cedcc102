//! Per-observer session logic, independent of the socket.
//!
//! [`open`] admits an observer: it allocates a queue, enqueues the
//! `initial_state` frame and registers the connection. [`dispatch`]
//! handles one inbound text frame. The `WebSocket` task in [`crate::ws`]
//! only moves bytes between the socket and these two functions.

use chainreaction_types::{ClientCommand, EventKind, ServerMessage, TruckId};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Frame, encode};
use crate::state::AppState;

/// Reply sent when an inbound frame is not valid JSON.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Reply sent for binary frames.
pub const BINARY_UNSUPPORTED: &str = "Binary frames are not supported";

/// Message types observers may send.
const KNOWN_TYPES: [&str; 3] = ["execute_arbitrage", "request_contract", "ping"];

/// Unregisters its connection when dropped.
///
/// Every exit path of a session drops the guard exactly once, so the
/// registry never keeps a handle for a finished session.
#[derive(Debug)]
pub struct SessionGuard {
    registry: ConnectionRegistry,
    id: ConnectionId,
}

impl SessionGuard {
    /// Connection this guard owns.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

/// An admitted observer: its id, its outbound queue and its guard.
#[derive(Debug)]
pub struct Session {
    /// Connection identity.
    pub id: ConnectionId,
    /// Frames to write to the socket, in order.
    pub outbound: mpsc::Receiver<Frame>,
    /// Drop to unregister.
    pub guard: SessionGuard,
}

/// Admit a new observer.
///
/// The snapshot is taken and the connection registered under the same
/// fleet read lock. Any later mutation therefore reaches this observer
/// as a broadcast queued behind its `initial_state`.
///
/// # Errors
///
/// Returns the serialization error if the snapshot cannot be encoded;
/// the observer is not registered in that case.
pub fn open(state: &AppState) -> Result<Session, serde_json::Error> {
    let id = state.registry.next_id();
    let (handle, outbound) = ConnectionHandle::channel(id, state.outbound_queue_capacity);

    state.fleet.read(|fleet| {
        let frame = encode(&ServerMessage::InitialState {
            data: fleet.snapshot(),
        })?;
        if handle.tx.try_send(frame).is_err() {
            warn!(conn = %id, "Fresh outbound queue rejected initial state");
        }
        state.registry.register(handle);
        Ok::<_, serde_json::Error>(())
    })?;

    info!(conn = %id, connections = state.registry.len(), "Observer connected");
    Ok(Session {
        id,
        outbound,
        guard: SessionGuard {
            registry: state.registry.clone(),
            id,
        },
    })
}

/// Handle one inbound text frame from `id`.
///
/// Malformed input produces an `error` reply to the sender only; the
/// session stays open.
pub fn dispatch(state: &AppState, id: ConnectionId, text: &str) {
    match parse_command(text) {
        Ok(command) => execute(state, id, command),
        Err(message) => {
            debug!(conn = %id, %message, "Rejected inbound frame");
            reply(state, id, &ServerMessage::error(message));
        }
    }
}

/// Answer a binary frame.
pub fn reject_binary(state: &AppState, id: ConnectionId) {
    reply(state, id, &ServerMessage::error(BINARY_UNSUPPORTED));
}

/// Decode a client command, mapping each failure to the text of its
/// `error` reply.
fn parse_command(text: &str) -> Result<ClientCommand, String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_err| String::from(INVALID_JSON))?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    match kind {
        Some(kind) if KNOWN_TYPES.contains(&kind.as_str()) => serde_json::from_value(value)
            .map_err(|e| format!("Invalid payload for {kind}: {e}")),
        Some(kind) => Err(format!("Unknown message type: {kind}")),
        None => Err(String::from("Missing message type")),
    }
}

fn execute(state: &AppState, id: ConnectionId, command: ClientCommand) {
    match command {
        ClientCommand::ExecuteArbitrage { truck_id } => execute_arbitrage(state, id, truck_id),
        ClientCommand::RequestContract { contract_id } => {
            let data = state.analyzer.get_contract(&contract_id);
            debug!(conn = %id, contract_id = %contract_id, found = data.is_some(), "Contract requested");
            reply(state, id, &ServerMessage::ContractData { data });
        }
        ClientCommand::Ping => reply(
            state,
            id,
            &ServerMessage::Pong {
                timestamp: Utc::now(),
            },
        ),
    }
}

/// Resolve the truck's delay and tell every observer.
fn execute_arbitrage(state: &AppState, id: ConnectionId, truck_id: TruckId) {
    let snapshot = state.fleet.write(|fleet| {
        if !fleet.resolve_delay(&truck_id) {
            return None;
        }
        fleet.record_event(
            EventKind::Success,
            format!("Arbitrage executed for {truck_id}"),
            Some(truck_id.clone()),
        );
        Some(fleet.snapshot())
    });

    let Some(snapshot) = snapshot else {
        reply(
            state,
            id,
            &ServerMessage::error(format!("Unknown truck: {truck_id}")),
        );
        return;
    };

    info!(conn = %id, truck_id = %truck_id, "Arbitrage executed");
    let executed = ServerMessage::ArbitrageExecuted {
        truck_id,
        timestamp: snapshot.timestamp,
    };
    let update = ServerMessage::StateUpdate { data: snapshot };
    for message in [executed, update] {
        match state.registry.broadcast_message(&message) {
            Ok(report) => {
                state
                    .loop_status
                    .record_broadcast(u64::try_from(report.delivered).unwrap_or(u64::MAX));
            }
            Err(e) => warn!(error = %e, kind = message.kind(), "Failed to encode broadcast"),
        }
    }
}

/// Send `message` to `id` only. Delivery failures are logged; a full or
/// closed queue has already evicted the observer.
fn reply(state: &AppState, id: ConnectionId, message: &ServerMessage) {
    let frame = match encode(message) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(conn = %id, error = %e, kind = message.kind(), "Failed to encode reply");
            return;
        }
    };
    if let Err(e) = state.registry.send_to(id, frame) {
        debug!(conn = %id, error = %e, "Reply not delivered");
    }
}
