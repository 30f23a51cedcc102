//! Connection registry: the set of live observers and fan-out to them.
//!
//! Every observer owns a bounded outbound queue drained by its socket
//! writer task. The registry holds the sending half. Fan-out copies the
//! handle set under a read lock, releases the lock, then enqueues without
//! blocking. A closed or full queue means the observer is gone or cannot
//! keep up; it is evicted after the batch, and dropping its sender ends
//! its writer task.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chainreaction_types::ServerMessage;
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// A serialized frame, shared by every queue it is delivered to.
pub type Frame = Arc<str>;

/// Opaque identity of one observer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identity plus outbound queue of one observer.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Connection identity.
    pub id: ConnectionId,
    /// Sending half of the observer's outbound queue.
    pub tx: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving half of its queue.
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, rx)
    }
}

/// Why a targeted delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The connection is not registered.
    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),

    /// The observer's queue is full; it has been evicted.
    #[error("outbound queue full for {0}")]
    QueueFull(ConnectionId),

    /// The observer's writer has gone away; it has been evicted.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Observers that accepted the frame.
    pub delivered: usize,
    /// Observers removed because delivery failed.
    pub evicted: usize,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    handles: RwLock<BTreeMap<ConnectionId, mpsc::Sender<Frame>>>,
}

/// Shared registry of live observer connections. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Inner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh connection id.
    pub fn next_id(&self) -> ConnectionId {
        // Wrapping after 2^64 connections is not a practical concern.
        ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add an observer. A handle with an id already present replaces it.
    pub fn register(&self, handle: ConnectionHandle) {
        let total = {
            let mut handles = self.inner.handles.write();
            handles.insert(handle.id, handle.tx);
            handles.len()
        };
        debug!(conn = %handle.id, total, "Connection registered");
    }

    /// Remove an observer. Returns whether it was present; calling this
    /// again for the same id is a no-op.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.handles.write().remove(&id).is_some();
        if removed {
            debug!(conn = %id, "Connection unregistered");
        }
        removed
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.handles.read().contains_key(&id)
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.inner.handles.read().len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.handles.read().is_empty()
    }

    /// Enqueue `frame` for every registered observer.
    ///
    /// Never blocks and never fails as a whole; observers whose queue is
    /// full or closed are evicted once the batch is done.
    pub fn broadcast(&self, frame: &Frame) -> BroadcastReport {
        let targets: Vec<(ConnectionId, mpsc::Sender<Frame>)> = self
            .inner
            .handles
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(Arc::clone(frame)) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    warn!(conn = %id, "Outbound queue full, evicting slow observer");
                    failed.push(id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(conn = %id, "Outbound queue closed, evicting");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut handles = self.inner.handles.write();
            for id in &failed {
                if handles.remove(id).is_some() {
                    report.evicted = report.evicted.saturating_add(1);
                }
            }
        }
        report
    }

    /// Serialize `message` once and fan it out.
    ///
    /// # Errors
    ///
    /// Returns the serialization error; nothing is sent in that case.
    pub fn broadcast_message(
        &self,
        message: &ServerMessage,
    ) -> Result<BroadcastReport, serde_json::Error> {
        let frame = encode(message)?;
        Ok(self.broadcast(&frame))
    }

    /// Enqueue `frame` for a single observer.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`]; a full or closed queue also evicts the
    /// observer.
    pub fn send_to(&self, id: ConnectionId, frame: Frame) -> Result<(), DeliveryError> {
        let tx = self
            .inner
            .handles
            .read()
            .get(&id)
            .cloned()
            .ok_or(DeliveryError::Unknown(id))?;

        match tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(conn = %id, "Outbound queue full, evicting slow observer");
                self.unregister(id);
                Err(DeliveryError::QueueFull(id))
            }
            Err(TrySendError::Closed(_)) => {
                self.unregister(id);
                Err(DeliveryError::Closed(id))
            }
        }
    }
}

/// Serialize a server message into a shareable frame.
///
/// # Errors
///
/// Returns the underlying `serde_json` error.
pub fn encode(message: &ServerMessage) -> Result<Frame, serde_json::Error> {
    serde_json::to_string(message).map(Frame::from)
}
