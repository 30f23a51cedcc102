//! Observer server for the ChainReaction broadcast engine.
//!
//! Observers connect over `WebSocket` (`/` or `/ws`), receive the current
//! fleet snapshot as `initial_state`, then every tick and command
//! broadcast in production order. They may send `execute_arbitrage`,
//! `request_contract` and `ping` commands.
//!
//! # Architecture
//!
//! Each observer owns a bounded outbound queue held by the
//! [`ConnectionRegistry`]. Fan-out never blocks: an observer whose queue
//! is full or closed is evicted and its socket closed. A small REST
//! surface (`/status`, `/api/...`) exposes the same state for tooling.

pub mod error;
pub mod handlers;
pub mod limiter;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use limiter::{ConnectionLimiter, ConnectionSlot};
pub use registry::{
    BroadcastReport, ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError, Frame,
    encode,
};
pub use router::build_router;
pub use server::ServerError;
pub use session::{Session, SessionGuard};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::AppState;
