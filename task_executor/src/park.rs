//! A thread parking primitive used by [`crate::ThreadPoolExecutor`] workers
//! to idle without busy-spinning while the job queue is empty.
//!
//! A single `Parker` value is both the parking and unparking side, shared
//! behind an `Arc` and cloned to hand the unpark half to another thread.
//! Built on `std::sync::{Mutex, Condvar}` rather than `parking_lot`
//! specifically so it can be modeled with `loom` under `cfg(loom)`.

#[cfg(not(loom))]
use std::time::Duration;

#[cfg(not(loom))]
use std::sync::{Arc, Condvar, Mutex};

#[cfg(loom)]
use loom::sync::{Arc, Condvar, Mutex};

struct Inner {
    notified: Mutex<bool>,
    condvar: Condvar,
}

/// A single-permit park/unpark pair. `unpark` is idempotent: calling it
/// before the matching `park` simply means the next `park` returns
/// immediately (the permit is stored, not lost), which is what rules out
/// the missed-wakeup race a bare `thread::park`/`unpark` would have if we
/// didn't control both sides through the same mutex.
#[derive(Clone)]
pub struct Parker {
    inner: Arc<Inner>,
}

impl Parker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                notified: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Blocks until a permit is available, consuming it.
    pub fn park(&self) {
        let mut notified = self.inner.notified.lock().unwrap();
        while !*notified {
            notified = self.inner.condvar.wait(notified).unwrap();
        }
        *notified = false;
    }

    /// Blocks until a permit is available or `timeout` elapses. Returns
    /// `true` if a permit was consumed, `false` on timeout. Not available
    /// under `loom`: model checking works over possible interleavings,
    /// not wall-clock time.
    #[cfg(not(loom))]
    pub fn park_timeout(&self, timeout: Duration) -> bool {
        let mut notified = self.inner.notified.lock().unwrap();
        if !*notified {
            let (guard, result) = self
                .inner
                .condvar
                .wait_timeout(notified, timeout)
                .unwrap();
            notified = guard;
            if result.timed_out() && !*notified {
                return false;
            }
        }
        *notified = false;
        true
    }

    /// Makes one permit available and wakes a single parked waiter, if
    /// any.
    pub fn unpark(&self) {
        let mut notified = self.inner.notified.lock().unwrap();
        *notified = true;
        drop(notified);
        self.inner.condvar.notify_one();
    }

    /// Wakes every waiter currently parked. Used on executor shutdown so
    /// all workers observe the shutdown flag promptly instead of waiting
    /// out their timeout.
    pub fn unpark_all(&self) {
        let mut notified = self.inner.notified.lock().unwrap();
        *notified = true;
        drop(notified);
        self.inner.condvar.notify_all();
    }
}

impl Default for Parker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn park_returns_after_unpark() {
        let parker = Parker::new();
        let other = parker.clone();
        let handle = thread::spawn(move || {
            other.park();
        });
        parker.unpark();
        handle.join().unwrap();
    }

    #[test]
    fn unpark_before_park_is_not_lost() {
        let parker = Parker::new();
        parker.unpark();
        // Should return immediately, the permit was already deposited.
        parker.park();
    }

    #[test]
    fn park_timeout_reports_timeout() {
        let parker = Parker::new();
        assert!(!parker.park_timeout(Duration::from_millis(10)));
    }
}
