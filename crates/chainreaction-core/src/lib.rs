//! Tick cycle and orchestration for the ChainReaction broadcast engine.
//!
//! This crate owns everything that happens on the clock: configuration,
//! the scripted scenario driver, the single-tick cycle and the loop that
//! repeats it.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `chainreaction-config.yaml`
//!   into strongly-typed structs.
//! - [`clock`] -- Logical tick clock.
//! - [`scenario`] -- [`ScenarioDriver`] and the demo script.
//! - [`tick`] -- One advance / scenarios / snapshot cycle.
//! - [`runner`] -- [`BroadcastLoop`] and the [`TickCallback`] seam.
//! - [`status`] -- Lock-free loop progress for the HTTP layer.
//!
//! [`ScenarioDriver`]: scenario::ScenarioDriver
//! [`BroadcastLoop`]: runner::BroadcastLoop
//! [`TickCallback`]: runner::TickCallback

pub mod clock;
pub mod config;
pub mod runner;
pub mod scenario;
pub mod status;
pub mod tick;
