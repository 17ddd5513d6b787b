use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use task_state::TaskError;

#[derive(Debug, thiserror::Error)]
#[error("task panicked: {0}")]
struct TaskPanicked(String);

fn describe_panic(payload: Box<dyn Any + Send>) -> TaskError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    Box::new(TaskPanicked(message))
}

/// Runs `f`, turning a panic into the same `TaskError` representation used
/// for an ordinary thrown exception. A task or continuation that panics
/// leaves its operation state in the `exception` status rather than
/// unwinding into the executor's worker loop.
pub fn catch_to_task_error<R>(f: impl FnOnce() -> R) -> Result<R, TaskError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(describe_panic)
}
