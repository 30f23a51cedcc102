//! Fleet state model for the ChainReaction broadcast engine.
//!
//! Holds the trucks, their routes and the event log, and applies the
//! per-tick and disruption mutation rules. Nothing here knows about
//! connections or timers.
//!
//! # Modules
//!
//! - [`state`] -- [`FleetState`] and its mutation rules
//! - [`handle`] -- [`FleetHandle`], the shared lock-guarded model
//! - [`event_log`] -- bounded append-only event log
//! - [`route`] -- route geometry generation
//! - [`manifest`] -- starting fleet definition
//! - [`error`] -- [`FleetError`]

pub mod error;
pub mod event_log;
pub mod handle;
pub mod manifest;
pub mod route;
pub mod state;

pub use error::FleetError;
pub use event_log::EventLog;
pub use handle::FleetHandle;
pub use manifest::{TruckSpec, default_manifest};
pub use route::generate_route;
pub use state::{DEFAULT_EVENT_RETENTION, DEFAULT_EVENT_WINDOW, FleetParams, FleetState};
