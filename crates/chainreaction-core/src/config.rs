//! Configuration loading and typed config structures for the ChainReaction
//! engine.
//!
//! The configuration lives in `chainreaction-config.yaml` at the project
//! root. Every section and field is optional; missing values fall back to
//! the defaults below, which reproduce the three-truck demo.
//!
//! `WS_HOST` and `WS_PORT` override the listen address after the file is
//! parsed.

use std::path::Path;
use std::time::Duration;

use chainreaction_fleet::{
    DEFAULT_EVENT_RETENTION, DEFAULT_EVENT_WINDOW, FleetParams, TruckSpec, default_manifest,
};
use serde::Deserialize;

use crate::scenario::{ScenarioSpec, demo_script};

/// Environment variable overriding [`ServerConfig::host`].
pub const ENV_HOST: &str = "WS_HOST";

/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "WS_PORT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv {
        /// The environment variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A parsed value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `chainreaction-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Listen address and connection limits.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tick loop timing.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Fleet model parameters and manifest.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Scripted disruptions, in any order.
    #[serde(default = "demo_script")]
    pub scenarios: Vec<ScenarioSpec>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            fleet: FleetConfig::default(),
            scenarios: demo_script(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::InvalidEnv`] / [`ConfigError::Invalid`] for bad values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise start from the defaults. Either
    /// way environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_file`].
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, and
    /// [`ConfigError::InvalidEnv`] / [`ConfigError::Invalid`] for bad values.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with_env(yaml, |key| std::env::var(key).ok())
    }

    /// Parse configuration, resolving environment overrides through
    /// `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::parse`].
    pub fn parse_with_env(
        yaml: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the listen address from `WS_HOST` / `WS_PORT` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `WS_PORT` is not a port number.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            self.server.port = raw.trim().parse().map_err(|_err| ConfigError::InvalidEnv {
                key: ENV_PORT,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_interval_ms == 0 {
            return Err(invalid("simulation.tick_interval_ms must be positive"));
        }
        if self.server.outbound_queue_capacity == 0 {
            return Err(invalid("server.outbound_queue_capacity must be positive"));
        }
        if self.fleet.event_window == 0 {
            return Err(invalid("fleet.event_window must be positive"));
        }
        if self.fleet.recovery_speed_min > self.fleet.recovery_speed_max {
            return Err(invalid(
                "fleet.recovery_speed_min must not exceed fleet.recovery_speed_max",
            ));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// HTTP / WebSocket server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum simultaneous observers (0 = unlimited).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Frames buffered per observer before it is considered stalled and
    /// disconnected.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
}

impl ServerConfig {
    /// `host:port` form of the listen address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
        }
    }
}

/// Tick loop timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Milliseconds to wait before the first tick.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Stop after this many ticks (0 = run until shutdown).
    #[serde(default)]
    pub max_ticks: u64,
}

impl SimulationConfig {
    /// Tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Startup delay as a [`Duration`].
    pub const fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            max_ticks: 0,
        }
    }
}

/// Fleet model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FleetConfig {
    /// RNG seed for route jitter and recovery speeds (absent = random).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Interpolation steps per route.
    #[serde(default = "default_route_steps")]
    pub route_steps: u32,

    /// Maximum per-coordinate route jitter in degrees.
    #[serde(default = "default_route_jitter")]
    pub route_jitter: f64,

    /// Events included in each snapshot.
    #[serde(default = "default_event_window")]
    pub event_window: usize,

    /// Events retained in memory.
    #[serde(default = "default_event_retention")]
    pub event_retention: usize,

    /// Lowest speed a recovered truck resumes at.
    #[serde(default = "default_recovery_speed_min")]
    pub recovery_speed_min: u32,

    /// Highest speed a recovered truck resumes at.
    #[serde(default = "default_recovery_speed_max")]
    pub recovery_speed_max: u32,

    /// Starting fleet.
    #[serde(default = "default_manifest")]
    pub trucks: Vec<TruckSpec>,
}

impl FleetConfig {
    /// Convert to the fleet model's parameter struct.
    pub const fn params(&self) -> FleetParams {
        FleetParams {
            route_steps: self.route_steps,
            route_jitter: self.route_jitter,
            event_window: self.event_window,
            event_retention: self.event_retention,
            recovery_speed_min: self.recovery_speed_min,
            recovery_speed_max: self.recovery_speed_max,
            seed: self.seed,
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            seed: None,
            route_steps: default_route_steps(),
            route_jitter: default_route_jitter(),
            event_window: default_event_window(),
            event_retention: default_event_retention(),
            recovery_speed_min: default_recovery_speed_min(),
            recovery_speed_max: default_recovery_speed_max(),
            trucks: default_manifest(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. `info`, `debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    String::from("localhost")
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_connections() -> usize {
    256
}

const fn default_outbound_queue_capacity() -> usize {
    64
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_startup_delay_ms() -> u64 {
    2000
}

const fn default_route_steps() -> u32 {
    chainreaction_fleet::route::DEFAULT_ROUTE_STEPS
}

const fn default_route_jitter() -> f64 {
    chainreaction_fleet::route::DEFAULT_ROUTE_JITTER
}

const fn default_event_window() -> usize {
    DEFAULT_EVENT_WINDOW
}

const fn default_event_retention() -> usize {
    DEFAULT_EVENT_RETENTION
}

const fn default_recovery_speed_min() -> u32 {
    60
}

const fn default_recovery_speed_max() -> u32 {
    75
}

fn default_log_level() -> String {
    String::from("info")
}
