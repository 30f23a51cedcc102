//! Enumeration types for the fleet model and contract records.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Truck status
// ---------------------------------------------------------------------------

/// Operational status of a truck.
///
/// Only [`TruckStatus::OnTime`] trucks move along their route on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum TruckStatus {
    /// Moving normally along the route.
    #[default]
    OnTime,
    /// Slowed down by a minor or major disruption.
    Delayed,
    /// Stopped by a critical disruption.
    Critical,
}

impl TruckStatus {
    /// Return the wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTime => "on-time",
            Self::Delayed => "delayed",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a delay injected into a truck.
///
/// Each level maps deterministically to a speed change and a new status;
/// see `FleetState::apply_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum DelaySeverity {
    /// Small slowdown (speed -20, floor 40).
    #[default]
    Minor,
    /// Large slowdown (speed -40, floor 20).
    Major,
    /// Full stop.
    Critical,
}

/// Severity attached to an event in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Informational.
    #[default]
    Info,
    /// Minor disruption.
    Minor,
    /// Major disruption.
    Major,
    /// Critical disruption.
    Critical,
}

impl From<DelaySeverity> for Severity {
    fn from(severity: DelaySeverity) -> Self {
        match severity {
            DelaySeverity::Minor => Self::Minor,
            DelaySeverity::Major => Self::Major,
            DelaySeverity::Critical => Self::Critical,
        }
    }
}

// ---------------------------------------------------------------------------
// Event kind
// ---------------------------------------------------------------------------

/// Category of an event.
///
/// The set is open: the well-known categories have their own variants and
/// anything else round-trips through [`EventKind::Other`]. On the wire the
/// kind is a plain lowercase string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventKind {
    /// General information.
    Info,
    /// A disruption that needs attention.
    Alert,
    /// A disruption was resolved.
    Success,
    /// Engine lifecycle notice.
    System,
    /// An arbitrage opportunity was detected.
    Arbitrage,
    /// Any other category.
    Other(String),
}

impl EventKind {
    /// Return the wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Alert => "alert",
            Self::Success => "success",
            Self::System => "system",
            Self::Arbitrage => "arbitrage",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "info" => Self::Info,
            "alert" => Self::Alert,
            "success" => Self::Success,
            "system" => Self::System,
            "arbitrage" => Self::Arbitrage,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Spot market
// ---------------------------------------------------------------------------

/// Availability of a spot-market carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Availability {
    /// Capacity readily available.
    High,
    /// Some capacity available.
    Medium,
    /// Little capacity available.
    Low,
}
