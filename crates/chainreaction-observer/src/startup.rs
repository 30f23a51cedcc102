//! Launch the observer server on a background task.
//!
//! The binary calls [`spawn_observer`] before starting the broadcast loop
//! so both run concurrently. Binding happens before the task is spawned,
//! so a port conflict fails startup instead of surfacing as a log line.

use std::net::SocketAddr;
use std::sync::Arc;

use chainreaction_core::config::ServerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// Address the listener is bound to.
    pub local_addr: SocketAddr,
    /// The server task; resolves after graceful shutdown.
    pub task: JoinHandle<()>,
}

/// Bind the configured address and serve on a background task until
/// `shutdown` carries `true` or its sender is dropped.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<ObserverHandle, StartupError> {
    let listener = server::bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener has no address: {e}")))?;

    let signal = async move {
        if shutdown.wait_for(|stop| *stop).await.is_err() {
            tracing::debug!("Shutdown sender dropped, stopping observer server");
        }
    };
    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, signal).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%local_addr, "Observer server spawned on background task");
    Ok(ObserverHandle { local_addr, task })
}
