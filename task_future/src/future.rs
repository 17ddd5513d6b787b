use std::sync::Arc;
use std::time::{Duration, Instant};

use task_executor::Executor;
use task_state::{
    Cardinality, Continuable, ContinuationKind, Error, OperationState, Shared, StopToken,
    TaskResult, Unique, WaitStatus,
};

/// A handle to an asynchronous result.
///
/// `get`, `share` and `detach` all take `self` and leave the handle empty
/// afterward, so a second call is a compile-time error for those (they're
/// consuming); `valid()`/`Error::FutureUninitialized` cover the handful of
/// operations that still take `&self`.
///
/// Dropping a future never blocks: an unready, non-detached handle simply
/// releases its `Arc`. The producer (or a kicked deferred launch) keeps
/// running to completion in the background and the eventual result is
/// discarded once the last holder is gone.
pub struct Future<T, C: Cardinality = Unique, K: ContinuationKind = Continuable> {
    state: Option<Arc<OperationState<T, C, K>>>,
}

impl<T, C: Cardinality, K: ContinuationKind> Future<T, C, K> {
    pub(crate) fn from_state(state: Arc<OperationState<T, C, K>>) -> Self {
        Self { state: Some(state) }
    }

    pub fn valid(&self) -> bool {
        self.state.is_some()
    }

    pub(crate) fn state(&self) -> TaskResult<&Arc<OperationState<T, C, K>>> {
        self.state
            .as_ref()
            .ok_or_else(|| Box::new(Error::FutureUninitialized) as task_state::TaskError)
    }

    pub(crate) fn state_arc(&self) -> TaskResult<Arc<OperationState<T, C, K>>> {
        self.state().map(Arc::clone)
    }

    pub(crate) fn take_state(&mut self) -> TaskResult<Arc<OperationState<T, C, K>>> {
        self.state
            .take()
            .ok_or_else(|| Box::new(Error::FutureUninitialized) as task_state::TaskError)
    }

    pub fn wait(&self) -> TaskResult<()> {
        self.state()?.wait();
        Ok(())
    }

    pub fn wait_for(&self, timeout: Duration) -> TaskResult<WaitStatus> {
        Ok(self.state()?.wait_for(timeout))
    }

    pub fn wait_until(&self, deadline: Instant) -> TaskResult<WaitStatus> {
        Ok(self.state()?.wait_until(deadline))
    }

    pub fn is_ready(&self) -> TaskResult<bool> {
        Ok(self.state()?.is_ready())
    }

    pub fn stop_token(&self) -> TaskResult<Option<StopToken>> {
        Ok(self.state()?.stop_token())
    }

    pub fn request_stop(&self) -> TaskResult<bool> {
        Ok(self.state()?.request_stop())
    }

    /// Relinquishes consumption intent: the state continues to
    /// completion (kicking a deferred launch if one is pending) and its
    /// eventual result is simply discarded.
    pub fn detach(mut self) -> TaskResult<()> {
        let state = self.take_state()?;
        state.mark_always_detached();
        state.kick();
        Ok(())
    }
}

impl<T: Send + 'static, K: ContinuationKind> Future<T, Unique, K> {
    pub fn get(mut self) -> TaskResult<T> {
        let state = self.take_state()?;
        state.get_value()
    }
}

impl<T: Clone + Send + Sync + 'static, K: ContinuationKind> Future<T, Shared, K> {
    pub fn get(&self) -> TaskResult<T> {
        self.state()?.get_value()
    }
}

impl<T, K: ContinuationKind> Clone for Future<T, Shared, K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

/// Converts a non-shared future into a shared one, invalidating `self`.
///
/// Rather than reinterpreting the same `Arc<OperationState<T, Unique, _>>`
/// as `Arc<OperationState<T, Shared, _>>` -- a different monomorphization
/// of the same generic type, not a safe no-op cast -- this spawns a small
/// bridging job on the default executor that waits for the antecedent
/// (kicking its deferred launch in the process) and forwards the result
/// into a freshly built shared state. This mirrors how `futures::future::Shared`
/// multicasts a single poll's result to every clone.
impl<T: Clone + Send + Sync + 'static, K: ContinuationKind> Future<T, Unique, K> {
    pub fn share(mut self) -> TaskResult<Future<T, Shared, K>> {
        let antecedent = self.take_state()?;
        let shared_state: Arc<OperationState<T, Shared, K>> = Arc::new(OperationState::new());
        let bridge_target = shared_state.clone();
        task_executor::default_executor().execute(Box::new(move || match antecedent.get_value() {
            Ok(value) => {
                let _ = bridge_target.set_value(value);
            }
            Err(err) => {
                let _ = bridge_target.set_exception(err);
            }
        }));
        Ok(Future::from_state(shared_state))
    }
}
