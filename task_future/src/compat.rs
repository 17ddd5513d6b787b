use std::future::Future as StdFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use atomic_waker::AtomicWaker;
use task_executor::boxed;
use task_executor::InlineExecutor;
use task_state::{Continuable, Continuation, OperationState, TaskResult, Unique};

use crate::future::Future;

/// Adapts a unique, continuable [`Future`] into a `std::future::Future`,
/// so it can be `.await`ed from inside an async runtime's task instead of
/// driven through `wait`/`get`.
///
/// This is the "adapter for typical network runtimes" the executor
/// interface calls for: it registers a continuation exactly once, on
/// first poll, that wakes the stored `std::task::Waker`; subsequent polls
/// just re-check readiness.
pub struct CompatFuture<T> {
    state: Option<Arc<OperationState<T, Unique, Continuable>>>,
    waker: Arc<AtomicWaker>,
    registered: bool,
}

impl<T: Send + 'static> CompatFuture<T> {
    pub(crate) fn new(state: Arc<OperationState<T, Unique, Continuable>>) -> Self {
        Self {
            state: Some(state),
            waker: Arc::new(AtomicWaker::new()),
            registered: false,
        }
    }
}

impl<T: Send + 'static> StdFuture for CompatFuture<T> {
    type Output = TaskResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let state = self
            .state
            .as_ref()
            .expect("CompatFuture polled again after completion")
            .clone();

        if state.is_ready() {
            self.state = None;
            return Poll::Ready(state.get_value());
        }

        self.waker.register(cx.waker());

        if !self.registered {
            self.registered = true;
            let waker = self.waker.clone();
            state.attach_continuation(Continuation::new(
                boxed(InlineExecutor::new()),
                Box::new(move || waker.wake()),
            ));
        }

        // Re-check: `set_value`/`set_exception` may have run between the
        // first `is_ready` probe above and the continuation registration.
        if state.is_ready() {
            self.state = None;
            return Poll::Ready(state.get_value());
        }

        Poll::Pending
    }
}

impl<T: Send + 'static> Future<T, Unique, Continuable> {
    /// Consumes this handle and returns an adapter implementing
    /// `std::future::Future`.
    pub fn into_std_future(mut self) -> CompatFuture<T> {
        let state = self
            .take_state()
            .expect("into_std_future called on an invalid handle");
        CompatFuture::new(state)
    }
}
