use std::sync::Arc;

use task_executor::BoxExecutor;
use task_state::{Continuable, OperationState, StopSource, StopToken, Unique};

use crate::future::Future;
use crate::panic_guard::catch_to_task_error;

/// Submits `task` to `executor` immediately and returns a future for its
/// result.
///
/// This is the eager counterpart to [`crate::make_deferred_future`]: the
/// state is constructed, the task is handed to the executor in the same
/// call, and the caller never has to do anything to make it start running.
/// A panic inside `task` is captured the same way a thrown exception would
/// be (see [`catch_to_task_error`]) and turned into the state's exception.
pub fn spawn<T, F>(executor: BoxExecutor, stop: Option<StopSource>, task: F) -> Future<T, Unique, Continuable>
where
    F: FnOnce(Option<StopToken>) -> T + Send + 'static,
    T: Send + 'static,
{
    let state: Arc<OperationState<T, Unique, Continuable>> = match stop {
        Some(stop) => Arc::new(OperationState::with_stop_source(stop)),
        None => Arc::new(OperationState::new()),
    };
    let stop_token = state.stop_token();
    let state_for_job = state.clone();

    let _span = tracing::trace_span!("task_future::launch::spawn").entered();
    executor.execute(Box::new(move || match catch_to_task_error(|| task(stop_token)) {
        Ok(value) => {
            let _ = state_for_job.set_value(value);
        }
        Err(err) => {
            let _ = state_for_job.set_exception(err);
        }
    }));

    Future::from_state(state)
}

/// As [`spawn`], for a task that reports failure as a [`task_state::TaskResult`]
/// rather than by panicking.
pub fn try_spawn<T, F>(
    executor: BoxExecutor,
    stop: Option<StopSource>,
    task: F,
) -> Future<T, Unique, Continuable>
where
    F: FnOnce(Option<StopToken>) -> task_state::TaskResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state: Arc<OperationState<T, Unique, Continuable>> = match stop {
        Some(stop) => Arc::new(OperationState::with_stop_source(stop)),
        None => Arc::new(OperationState::new()),
    };
    let stop_token = state.stop_token();
    let state_for_job = state.clone();

    let _span = tracing::trace_span!("task_future::launch::try_spawn").entered();
    executor.execute(Box::new(move || {
        match catch_to_task_error(|| task(stop_token)) {
            Ok(Ok(value)) => {
                let _ = state_for_job.set_value(value);
            }
            Ok(Err(err)) => {
                let _ = state_for_job.set_exception(err);
            }
            Err(panic_err) => {
                let _ = state_for_job.set_exception(panic_err);
            }
        }
    }));

    Future::from_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_executor::{boxed, InlineExecutor};

    #[test]
    fn spawn_runs_on_the_given_executor_and_resolves_the_future() {
        let future = spawn(boxed(InlineExecutor::new()), None, |_stop| 2 + 2);
        assert_eq!(future.get().unwrap(), 4);
    }

    #[test]
    fn spawn_captures_a_panic_as_an_exception() {
        let future = spawn::<i32, _>(boxed(InlineExecutor::new()), None, |_stop| {
            panic!("boom");
        });
        assert!(future.get().is_err());
    }

    #[test]
    fn try_spawn_propagates_the_task_error() {
        #[derive(Debug, thiserror::Error)]
        #[error("nope")]
        struct Nope;

        let future = try_spawn::<i32, _>(boxed(InlineExecutor::new()), None, |_stop| {
            Err(Box::new(Nope) as task_state::TaskError)
        });
        let err = future.get().unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
