//! Cooperative cancellation: a shared "stop requested" flag with a writer
//! (`StopSource`) and reader (`StopToken`) handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
}

/// Writer handle for a stop signal. Cheap to clone; every clone observes
/// and can transition the same underlying flag.
#[derive(Debug, Clone)]
pub struct StopSource {
    inner: Arc<Inner>,
}

impl StopSource {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
        }
    }

    /// Returns a [`StopToken`] observing this source's flag.
    pub fn token(&self) -> StopToken {
        StopToken {
            inner: self.inner.clone(),
        }
    }

    /// Requests a stop. Idempotent.
    ///
    /// Returns `true` if this call was the one that transitioned the flag
    /// from not-requested to requested, `false` if it was already set (or
    /// concurrently set by another caller).
    ///
    /// The stop flag has no notion of the associated operation state's
    /// readiness; callers that need the "no-op once ready" rule
    /// (`Future::request_stop`) check readiness themselves before calling
    /// this.
    pub fn request_stop(&self) -> bool {
        !self.inner.requested.swap(true, Ordering::SeqCst)
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader handle for a stop signal, injected as a task's first argument
/// when the task was constructed expecting one.
#[derive(Debug, Clone)]
pub struct StopToken {
    inner: Arc<Inner>,
}

impl StopToken {
    pub fn stop_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_stop_is_idempotent_and_reports_transition() {
        let source = StopSource::new();
        let token = source.token();
        assert!(!token.stop_requested());

        assert!(source.request_stop());
        assert!(token.stop_requested());

        // Second call: already set, not the transitioning call.
        assert!(!source.request_stop());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let source = StopSource::new();
        let source2 = source.clone();
        source2.request_stop();
        assert!(source.stop_requested());
    }
}
