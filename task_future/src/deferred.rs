use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use task_executor::BoxExecutor;
use task_state::{OperationState, StopSource, StopToken, Unique};

use crate::future::Future;
use crate::panic_guard::catch_to_task_error;

/// Guards a deferred task's single launch against concurrent triggers from
/// `wait`, `get`, `attach_continuation` and `share` -- every one of them
/// calls the installed trigger unconditionally, relying on this guard's
/// `begin` to let exactly one of them through.
#[derive(Default)]
pub struct LaunchGuard {
    launched: AtomicBool,
}

impl LaunchGuard {
    pub fn new() -> Self {
        Self {
            launched: AtomicBool::new(false),
        }
    }

    /// Returns `true` for the first caller only.
    pub fn begin(&self) -> bool {
        !self.launched.swap(true, Ordering::AcqRel)
    }
}

/// Builds a future whose task has not been submitted anywhere yet. The task
/// (and its bound captures) run at most once, on first demand, per
/// `OperationState::set_deferred_trigger`. Using an [`task_executor::InlineExecutor`]
/// makes that first demand run the task synchronously, matching the
/// "deferred states never allocate a mutex/cv pair when the launching
/// executor is inline" fast path -- the wake-up is simply the caller's own
/// stack unwinding back out of `wait`.
pub fn make_deferred_future<T, F>(
    executor: BoxExecutor,
    stop: Option<StopSource>,
    task: F,
) -> Future<T, Unique, task_state::Continuable>
where
    F: FnOnce(Option<StopToken>) -> T + Send + 'static,
    T: Send + 'static,
{
    let state: Arc<OperationState<T, Unique, task_state::Continuable>> = match stop {
        Some(stop) => Arc::new(OperationState::with_stop_source(stop)),
        None => Arc::new(OperationState::new()),
    };

    let guard = Arc::new(LaunchGuard::new());
    let task_cell = Arc::new(Mutex::new(Some(task)));
    let stop_token = state.stop_token();
    let state_for_trigger = state.clone();

    state.set_deferred_trigger(Box::new(move || {
        if !guard.begin() {
            return;
        }
        let Some(task) = task_cell.lock().take() else {
            return;
        };
        let state = state_for_trigger.clone();
        let stop_token = stop_token.clone();
        let _span = tracing::trace_span!("task_future::deferred::launch").entered();
        executor.execute(Box::new(move || match catch_to_task_error(|| task(stop_token)) {
            Ok(value) => {
                let _ = state.set_value(value);
            }
            Err(err) => {
                let _ = state.set_exception(err);
            }
        }));
    }));

    Future::from_state(state)
}

/// As [`make_deferred_future`], for a task that may itself fail and wants
/// to report that failure as an `exception` rather than a Rust value.
pub fn make_fallible_deferred_future<T, F>(
    executor: BoxExecutor,
    stop: Option<StopSource>,
    task: F,
) -> Future<T, Unique, task_state::Continuable>
where
    F: FnOnce(Option<StopToken>) -> task_state::TaskResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state: Arc<OperationState<T, Unique, task_state::Continuable>> = match stop {
        Some(stop) => Arc::new(OperationState::with_stop_source(stop)),
        None => Arc::new(OperationState::new()),
    };

    let guard = Arc::new(LaunchGuard::new());
    let task_cell = Arc::new(Mutex::new(Some(task)));
    let stop_token = state.stop_token();
    let state_for_trigger = state.clone();

    state.set_deferred_trigger(Box::new(move || {
        if !guard.begin() {
            return;
        }
        let Some(task) = task_cell.lock().take() else {
            return;
        };
        let state = state_for_trigger.clone();
        let stop_token = stop_token.clone();
        let _span = tracing::trace_span!("task_future::deferred::launch").entered();
        executor.execute(Box::new(move || {
            match catch_to_task_error(|| task(stop_token)) {
                Ok(Ok(value)) => {
                    let _ = state.set_value(value);
                }
                Ok(Err(err)) => {
                    let _ = state.set_exception(err);
                }
                Err(panic_err) => {
                    let _ = state.set_exception(panic_err);
                }
            }
        }));
    }));

    Future::from_state(state)
}
