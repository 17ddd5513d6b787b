use crate::{Executor, Job};

/// Runs every submitted job synchronously on the calling thread.
///
/// Useful for deferred futures that should run at the point they are
/// first waited on rather than being handed off to a worker, and for
/// tests that want deterministic, single-threaded continuation ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_synchronously_before_execute_returns() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        InlineExecutor::new().execute(Box::new(move || {
            ran2.store(true, Ordering::SeqCst);
        }));
        assert!(ran.load(Ordering::SeqCst));
    }
}
