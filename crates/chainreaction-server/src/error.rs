//! Error types for the server binary.
//!
//! [`AppError`] wraps every failure that can stop the process. Only
//! startup can fail; once the loop runs, errors are handled in place.

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: chainreaction_core::config::ConfigError,
    },

    /// The starting fleet could not be built.
    #[error("fleet error: {source}")]
    Fleet {
        /// The underlying fleet error.
        #[from]
        source: chainreaction_fleet::FleetError,
    },

    /// The broadcast loop stopped abnormally.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: chainreaction_core::runner::RunnerError,
    },

    /// The observer server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: chainreaction_observer::StartupError,
    },
}
