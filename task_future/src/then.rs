use std::sync::Arc;

use task_executor::BoxExecutor;
use task_state::{
    Cardinality, Continuable, Continuation, ExtractValue, OperationState, Shared, TaskResult,
    Unique,
};

use crate::future::Future;
use crate::panic_guard::catch_to_task_error;

/// Builds the continuation state `B`, registers it on `antecedent`, and
/// returns the handle to `B`. Shared between the `Unique` and `Shared`
/// `then` entry points below -- both end up with an owned `T` (moved for a
/// unique antecedent, cloned for a shared one) once `extract_value` runs,
/// so the rest of the wiring doesn't need to know which.
fn spawn_continuation<T, CA, R, F>(
    antecedent: Arc<OperationState<T, CA, Continuable>>,
    executor: BoxExecutor,
    f: F,
) -> Future<R, Unique, Continuable>
where
    CA: Cardinality,
    OperationState<T, CA, Continuable>: ExtractValue<T>,
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(T) -> R + Send + 'static,
{
    let continuation_state: Arc<OperationState<R, Unique, Continuable>> =
        Arc::new(OperationState::new());
    let result_state = continuation_state.clone();
    let antecedent_for_callback = antecedent.clone();

    let callback: Box<dyn FnOnce() + Send> = Box::new(move || match antecedent_for_callback.extract_value() {
        Ok(value) => match catch_to_task_error(move || f(value)) {
            Ok(result) => {
                let _ = result_state.set_value(result);
            }
            Err(err) => {
                let _ = result_state.set_exception(err);
            }
        },
        // A failed antecedent is not passed to `f`; its exception is
        // propagated into `B` unchanged.
        Err(err) => {
            let _ = result_state.set_exception(err);
        }
    });

    // `attach_continuation` is the single call that both registers `f`
    // for the not-yet-ready case and, if the antecedent raced ahead to
    // readiness first, submits it immediately.
    antecedent.attach_continuation(Continuation::new(executor, callback));
    Future::from_state(continuation_state)
}

impl<T: Send + 'static> Future<T, Unique, Continuable> {
    /// Registers `f` to run, on the default executor, once this future's
    /// value (or exception) is available. Consumes the antecedent handle.
    pub fn then<R, F>(self, f: F) -> TaskResult<Future<R, Unique, Continuable>>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        self.then_on(task_executor::default_executor(), f)
    }

    pub fn then_on<R, F>(mut self, executor: BoxExecutor, f: F) -> TaskResult<Future<R, Unique, Continuable>>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let antecedent = self.take_state()?;
        Ok(spawn_continuation(antecedent, executor, f))
    }
}

impl<T: Clone + Send + Sync + 'static> Future<T, Shared, Continuable> {
    /// As [`Future::then`], for a shared antecedent: doesn't consume
    /// `self`, since a shared future may grow more than one continuation.
    pub fn then<R, F>(&self, f: F) -> TaskResult<Future<R, Unique, Continuable>>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        self.then_on(task_executor::default_executor(), f)
    }

    pub fn then_on<R, F>(&self, executor: BoxExecutor, f: F) -> TaskResult<Future<R, Unique, Continuable>>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let antecedent = self.state_arc()?;
        Ok(spawn_continuation(antecedent, executor, f))
    }
}
