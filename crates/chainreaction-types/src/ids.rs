//! Type-safe identifier wrappers.
//!
//! Fleet entities (trucks, contracts) are keyed by the human-readable codes
//! that appear on the manifest and in contracts (`TRK-402`, `CNT-2024-001`).
//! Events are keyed by a monotonically assigned sequence number so that ids
//! are both unique and orderable in arrival order.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a [`String`] code with standard derives.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like code.
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Borrow the underlying code.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }
    };
}

define_key! {
    /// Unique, stable identifier of a truck in the fleet (e.g. `TRK-402`).
    TruckId
}

define_key! {
    /// Identifier of a delivery contract (e.g. `CNT-2024-001`).
    ContractId
}

/// Prefix used in the wire form of an [`EventId`].
const EVENT_ID_PREFIX: &str = "evt-";

/// Digits in the wire form; enough for any `u64`.
const EVENT_ID_WIDTH: usize = 20;

/// Sequence-assigned identifier of an event in the fleet event log.
///
/// Ids are handed out by the event log in strictly increasing order, so
/// comparing two ids compares their arrival order. On the wire an id is
/// rendered as `evt-<n>` with `n` zero-padded to 20 digits, so the strings
/// sort the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EventId(pub u64);

impl EventId {
    /// Return the raw sequence number.
    pub const fn sequence(self) -> u64 {
        self.0
    }

    /// Return the id that follows this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EVENT_ID_PREFIX}{:0width$}", self.0, width = EVENT_ID_WIDTH)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.to_string()
    }
}

/// Error returned when a string is not a valid `evt-<n>` event id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEventId(pub String);

impl fmt::Display for InvalidEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid event id: {}", self.0)
    }
}

impl std::error::Error for InvalidEventId {}

impl TryFrom<String> for EventId {
    type Error = InvalidEventId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix(EVENT_ID_PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .map(Self)
            .ok_or(InvalidEventId(value))
    }
}
