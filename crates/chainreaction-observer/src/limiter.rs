//! Cap on simultaneous observer connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts live observer sessions against a maximum.
#[derive(Debug)]
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    /// Create a limiter. A `max` of zero means unlimited.
    pub const fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Reserve a slot, or `None` if the limit is reached.
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionSlot> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if self.max > 0 && current >= self.max {
                return None;
            }
            let next = current.checked_add(1)?;
            if self
                .current
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionSlot {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    /// Number of slots currently held.
    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    /// Configured maximum (0 = unlimited).
    pub const fn max(&self) -> usize {
        self.max
    }
}

/// A held connection slot. Owned, so it can move into the upgraded
/// socket task and live exactly as long as the session.
#[derive(Debug)]
pub struct ConnectionSlot {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_enforced_and_released_on_drop() {
        let limiter = Arc::new(ConnectionLimiter::new(2));
        let a = limiter.try_acquire();
        let b = limiter.try_acquire();
        assert!(a.is_some() && b.is_some());
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.current_count(), 2);

        drop(a);
        assert_eq!(limiter.current_count(), 1);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    fn zero_means_unlimited() {
        let limiter = Arc::new(ConnectionLimiter::new(0));
        let slots: Vec<_> = (0..100).filter_map(|_| limiter.try_acquire()).collect();
        assert_eq!(slots.len(), 100);
    }
}
