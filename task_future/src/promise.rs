use std::sync::Arc;

use task_state::{
    Cardinality, Continuable, ContinuationKind, Error, OperationState, StopSource, StopToken,
    TaskError, TaskResult, Unique,
};

use crate::future::Future;

/// The producer side of a future/promise pair.
///
/// Dropping a `Promise` that never called `set_value`/`set_exception`
/// writes a `broken_promise` exception into the state, unless the state
/// was marked `always_detached` (which only a deferred/packaged-task
/// construction path does -- plain promises are never detached).
pub struct Promise<T, C: Cardinality = Unique, K: ContinuationKind = Continuable> {
    state: Option<Arc<OperationState<T, C, K>>>,
    future_retrieved: bool,
}

impl<T, C: Cardinality, K: ContinuationKind> Promise<T, C, K> {
    pub fn new() -> Self {
        Self {
            state: Some(Arc::new(OperationState::new())),
            future_retrieved: false,
        }
    }

    pub fn with_stop_source(stop: StopSource) -> Self {
        Self {
            state: Some(Arc::new(OperationState::with_stop_source(stop))),
            future_retrieved: false,
        }
    }

    /// Retrievable exactly once.
    pub fn get_future(&mut self) -> TaskResult<Future<T, C, K>> {
        if self.future_retrieved {
            return Err(Box::new(Error::FutureAlreadyRetrieved) as TaskError);
        }
        let state = self
            .state
            .as_ref()
            .expect("promise state outlives the promise")
            .clone();
        self.future_retrieved = true;
        Ok(Future::from_state(state))
    }

    pub fn set_value(&self, value: T) -> TaskResult<()> {
        self.state()?.set_value(value).map_err(|e| Box::new(e) as TaskError)
    }

    pub fn set_exception(&self, err: TaskError) -> TaskResult<()> {
        self.state()?.set_exception(err).map_err(|e| Box::new(e) as TaskError)
    }

    pub fn stop_token(&self) -> Option<StopToken> {
        self.state.as_ref().and_then(|s| s.stop_token())
    }

    fn state(&self) -> TaskResult<&Arc<OperationState<T, C, K>>> {
        self.state
            .as_ref()
            .ok_or_else(|| Box::new(Error::PromiseUninitialized) as TaskError)
    }
}

impl<T, C: Cardinality, K: ContinuationKind> Default for Promise<T, C, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Cardinality, K: ContinuationKind> Drop for Promise<T, C, K> {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            state.fail_if_unset_with_broken_promise();
        }
    }
}
