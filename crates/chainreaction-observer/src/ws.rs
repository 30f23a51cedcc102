//! `WebSocket` endpoint for observers.
//!
//! Clients connect to `GET /` or `GET /ws`, receive `initial_state`, then
//! every broadcast in production order. The socket is split: a writer
//! task drains the session's outbound queue, while the upgrade task reads
//! inbound frames and hands them to [`session::dispatch`]. Whichever half
//! finishes first ends the session, and the [`session::SessionGuard`]
//! unregisters the connection.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::ObserverError;
use crate::limiter::ConnectionSlot;
use crate::session;
use crate::state::AppState;

/// Upgrade an HTTP request to an observer session.
///
/// # Route
///
/// `GET /` and `GET /ws`
///
/// The connection limit is checked before the upgrade request itself,
/// so a full server answers `503` even to malformed upgrades.
pub async fn ws_observer(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(slot) = state.limiter.try_acquire() else {
        warn!(
            max = state.limiter.max(),
            "Connection limit reached, rejecting observer"
        );
        return ObserverError::TooManyConnections(state.limiter.max()).into_response();
    };

    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| run_session(socket, state, slot))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn run_session(socket: WebSocket, state: Arc<AppState>, slot: ConnectionSlot) {
    let session = match session::open(&state) {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Failed to open observer session");
            return;
        }
    };

    let span = info_span!("observer", conn = %session.id);
    drive(socket, &state, session).instrument(span).await;
    drop(slot);
}

async fn drive(socket: WebSocket, state: &AppState, session: session::Session) {
    let session::Session {
        id,
        mut outbound,
        guard,
    } = session;
    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(
        async move {
            while let Some(frame) = outbound.recv().await {
                if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                    debug!("Socket write failed");
                    break;
                }
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Socket close failed");
            }
        }
        .in_current_span(),
    );

    loop {
        tokio::select! {
            _ = &mut writer => {
                debug!("Writer finished");
                break;
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => session::dispatch(state, id, text.as_str()),
                    Some(Ok(Message::Binary(_))) => session::reject_binary(state, id),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Observer closed the connection");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "Socket read failed");
                        break;
                    }
                }
            }
        }
    }

    drop(guard);
    writer.abort();
    info!(connections = state.registry.len(), "Observer disconnected");
}
