//! Append-only fleet event log with bounded retention.
//!
//! Events are kept in arrival order. Ids come from a monotonically
//! increasing sequence, so they are unique and sort in arrival order even
//! after old entries are evicted.

use std::collections::VecDeque;

use chainreaction_types::{Event, EventId, EventKind, Severity, TruckId};
use chrono::Utc;

/// Ring buffer of recent fleet events.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    retention: usize,
    last_id: EventId,
}

impl EventLog {
    /// Create an empty log that keeps at most `retention` events.
    ///
    /// A retention of zero is treated as one.
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            entries: VecDeque::with_capacity(retention.min(1024)),
            retention,
            last_id: EventId(0),
        }
    }

    /// Append a new event stamped with a fresh id and the current time.
    pub fn append(
        &mut self,
        kind: EventKind,
        severity: Severity,
        message: impl Into<String>,
        truck_id: Option<TruckId>,
    ) -> EventId {
        // u64 exhaustion is unreachable in practice; saturate rather than wrap.
        let id = self.last_id.next().unwrap_or(self.last_id);
        self.last_id = id;

        if self.entries.len() >= self.retention {
            self.entries.pop_front();
        }
        self.entries.push_back(Event {
            id,
            timestamp: Utc::now(),
            kind,
            severity,
            message: message.into(),
            truck_id,
        });
        id
    }

    /// Return up to `n` of the most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Event> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Return the newest event, if any.
    pub fn last(&self) -> Option<&Event> {
        self.entries.back()
    }

    /// Number of events currently retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of events ever appended, including evicted ones.
    pub const fn total_appended(&self) -> u64 {
        self.last_id.sequence()
    }

    /// Maximum number of retained events.
    pub const fn retention(&self) -> usize {
        self.retention
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(log: &mut EventLog, msg: &str) -> EventId {
        log.append(EventKind::Info, Severity::Info, msg, None)
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut log = EventLog::new(10);
        assert_eq!(info(&mut log, "a"), EventId(1));
        assert_eq!(info(&mut log, "b"), EventId(2));
        assert_eq!(log.total_appended(), 2);
    }

    #[test]
    fn recent_returns_newest_in_arrival_order() {
        let mut log = EventLog::new(100);
        for i in 0..15 {
            info(&mut log, &format!("event {i}"));
        }
        let recent = log.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first().unwrap().message, "event 5");
        assert_eq!(recent.last().unwrap().message, "event 14");
        assert!(recent.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn recent_with_fewer_entries_returns_all() {
        let mut log = EventLog::new(100);
        info(&mut log, "only");
        assert_eq!(log.recent(10).len(), 1);
        assert!(EventLog::new(5).recent(10).is_empty());
    }

    #[test]
    fn retention_evicts_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            info(&mut log, &format!("event {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(10).first().unwrap().message, "event 2");
        assert_eq!(log.last().unwrap().id, EventId(5));
        assert_eq!(log.total_appended(), 5);
    }

    #[test]
    fn zero_retention_keeps_latest() {
        let mut log = EventLog::new(0);
        info(&mut log, "a");
        info(&mut log, "b");
        assert_eq!(log.retention(), 1);
        assert_eq!(log.last().unwrap().message, "b");
    }
}
