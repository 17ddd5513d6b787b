use std::sync::Arc;

use task_state::{Continuable, OperationState, TaskError, Unique};

use crate::future::Future;

/// A future already in the `value` status.
pub fn make_ready_future<T: Send + 'static>(value: T) -> Future<T, Unique, Continuable> {
    let state: Arc<OperationState<T, Unique, Continuable>> = Arc::new(OperationState::new());
    state.set_value(value).expect("freshly constructed state is unset");
    Future::from_state(state)
}

/// The void specialization: a future that is immediately ready with no
/// carried value.
pub fn make_ready_void_future() -> Future<(), Unique, Continuable> {
    make_ready_future(())
}

/// A future already in the `exception` status.
pub fn make_exceptional_future<T: Send + 'static>(err: TaskError) -> Future<T, Unique, Continuable> {
    let state: Arc<OperationState<T, Unique, Continuable>> = Arc::new(OperationState::new());
    state
        .set_exception(err)
        .expect("freshly constructed state is unset");
    Future::from_state(state)
}
