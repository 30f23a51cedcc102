//! Broadcast engine binary for ChainReaction.
//!
//! Wires the fleet model, the contract book, the observer server and the
//! broadcast loop together, then runs until `Ctrl-C` or the configured
//! tick bound.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `chainreaction-config.yaml` (or the path
//!    given as the first argument), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Build the starting fleet and the contract book
//! 4. Start the observer server
//! 5. Run the broadcast loop
//! 6. Stop the observer server and log the result

mod error;
mod observer_callback;

use std::path::PathBuf;
use std::sync::Arc;

use chainreaction_contracts::{ContractAnalyzer, InMemoryContractBook};
use chainreaction_core::config::{AppConfig, LoggingConfig};
use chainreaction_core::runner::{BroadcastLoop, LoopSettings};
use chainreaction_core::scenario::ScenarioDriver;
use chainreaction_core::status::LoopStatus;
use chainreaction_fleet::{FleetHandle, FleetState};
use chainreaction_observer::state::AppState;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::observer_callback::ObserverCallback;

/// Config file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "chainreaction-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, fleet construction, binding the
/// observer server or the broadcast loop fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = AppConfig::load_or_default(&config_path)?;

    // 2. Logging.
    init_tracing(&config.logging);
    info!(
        path = %config_path.display(),
        bind = %config.server.bind_address(),
        tick_interval_ms = config.simulation.tick_interval_ms,
        trucks = config.fleet.trucks.len(),
        scenarios = config.scenarios.len(),
        "chainreaction-server starting"
    );

    // 3. Fleet and contracts.
    let fleet = FleetHandle::new(FleetState::from_manifest(
        &config.fleet.trucks,
        config.fleet.params(),
    )?);
    let analyzer: Arc<dyn ContractAnalyzer> = Arc::new(InMemoryContractBook::demo(Utc::now()));

    // 4. Observer server.
    let status = Arc::new(LoopStatus::new());
    let app_state = Arc::new(
        AppState::new(fleet.clone(), Arc::clone(&analyzer))
            .with_max_connections(config.server.max_connections)
            .with_queue_capacity(config.server.outbound_queue_capacity)
            .with_loop_status(Arc::clone(&status)),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let observer = chainreaction_observer::spawn_observer(
        &config.server,
        Arc::clone(&app_state),
        shutdown_rx.clone(),
    )
    .await?;
    info!(addr = %observer.local_addr, "WebSocket server running");

    spawn_ctrl_c_listener(Arc::clone(&shutdown_tx));

    // 5. Broadcast loop.
    let mut broadcast = BroadcastLoop::new(
        fleet,
        ScenarioDriver::from_specs(&config.scenarios),
        analyzer,
        LoopSettings::from(&config.simulation),
    )
    .with_status(status);
    let mut callback = ObserverCallback::new(Arc::clone(&app_state));
    let outcome = broadcast.run(&mut callback, shutdown_rx).await?;

    // 6. Shutdown.
    shutdown_tx.send_replace(true);
    if let Err(e) = observer.task.await {
        warn!(error = %e, "Observer server task did not finish cleanly");
    }

    info!(
        end_reason = ?outcome.end_reason,
        total_ticks = outcome.total_ticks,
        "chainreaction-server shutdown complete"
    );
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_ctrl_c_listener(shutdown: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                shutdown.send_replace(true);
            }
            Err(e) => {
                // Holding the sender keeps the loop running without a signal.
                warn!(error = %e, "Ctrl-C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    });
}
