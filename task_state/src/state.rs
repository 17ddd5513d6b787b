use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace_span;

use crate::continuation::Continuation;
use crate::error::{Error, TaskError, TaskResult};
use crate::options::{Cardinality, Continuable, ContinuationKind, Unique};
use crate::slot::Slot;
use crate::stop::{StopSource, StopToken};

const UNSET: u8 = 0;
const VALUE: u8 = 1;
const EXCEPTION: u8 = 2;
const DRAINED: u8 = 3;

/// The outcome of a timed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Ready,
    Timeout,
}

struct Inner<T, K: ContinuationKind> {
    slot: Slot<T>,
    continuations: K::Slot,
}

/// The shared block behind every future/promise pair: status, storage,
/// waiters, and the optional stop/continuation/deferred facets.
///
/// `C` (a [`Cardinality`]) and `K` (a [`ContinuationKind`]) are genuine
/// zero-cost type parameters; `stoppable`, `deferred` and
/// `always_detached` are plain fields present on every state regardless
/// of whether they are used (see `options.rs` for why).
pub struct OperationState<T, C: Cardinality = Unique, K: ContinuationKind = Continuable> {
    status: AtomicU8,
    inner: Mutex<Inner<T, K>>,
    condvar: Condvar,
    stop: Option<StopSource>,
    deferred_trigger: std::sync::OnceLock<Box<dyn Fn() + Send + Sync>>,
    external_waiters: AtomicUsize,
    always_detached: AtomicBool,
    _cardinality: PhantomData<C>,
}

impl<T, C: Cardinality, K: ContinuationKind> OperationState<T, C, K> {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(UNSET),
            inner: Mutex::new(Inner {
                slot: Slot::Empty,
                continuations: Default::default(),
            }),
            condvar: Condvar::new(),
            stop: None,
            deferred_trigger: std::sync::OnceLock::new(),
            external_waiters: AtomicUsize::new(0),
            always_detached: AtomicBool::new(false),
            _cardinality: PhantomData,
        }
    }

    pub fn with_stop_source(stop: StopSource) -> Self {
        Self {
            stop: Some(stop),
            ..Self::new()
        }
    }

    /// Installs the closure that performs a deferred state's single
    /// launch. Called once, immediately after the state is wrapped in an
    /// `Arc`, by `task_future`'s deferred-future constructor -- the
    /// closure itself captures that `Arc` so it can route the task's
    /// result back into `set_value`/`set_exception` once it runs.
    ///
    /// The closure must be idempotent under concurrent invocation: `wait`,
    /// `get_value`, `attach_continuation` and `share` all call it
    /// unconditionally, relying on the closure's own "exactly once" guard
    /// (see `task_future::deferred::LaunchGuard`).
    pub fn set_deferred_trigger(&self, trigger: Box<dyn Fn() + Send + Sync>) {
        let _ = self.deferred_trigger.set(trigger);
    }

    fn trigger_deferred(&self) {
        if let Some(trigger) = self.deferred_trigger.get() {
            trigger();
        }
    }

    pub fn stop_token(&self) -> Option<StopToken> {
        self.stop.as_ref().map(StopSource::token)
    }

    /// No-op once the state is already ready: a completed operation can no
    /// longer be cancelled.
    pub fn request_stop(&self) -> bool {
        if self.is_ready() {
            return false;
        }
        self.stop.as_ref().is_some_and(StopSource::request_stop)
    }

    pub fn mark_always_detached(&self) {
        self.always_detached.store(true, Ordering::Relaxed);
    }

    pub fn is_always_detached(&self) -> bool {
        self.always_detached.load(Ordering::Relaxed)
    }

    pub fn add_external_waiter(&self) {
        self.external_waiters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove_external_waiter(&self) {
        self.external_waiters.fetch_sub(1, Ordering::Relaxed);
    }

    /// Forces the deferred-launch trigger to run (if one is installed)
    /// without otherwise blocking. Used by `when_all`/`when_any` to launch
    /// deferred inputs the moment the aggregate itself is first waited on,
    /// and by `Future::detach`, which wants the task to still run to
    /// completion even though nobody is going to call `get`.
    pub fn kick(&self) {
        self.trigger_deferred();
    }

    /// Writes a `broken_promise` exception if the state was never
    /// satisfied and isn't `always_detached`. Called from `Promise`'s
    /// `Drop` impl.
    pub fn fail_if_unset_with_broken_promise(&self) {
        if !self.is_always_detached() && self.status.load(Ordering::Acquire) == UNSET {
            tracing::warn!("promise dropped without setting a value or exception");
            let _ = self.set_exception(Box::new(Error::BrokenPromise));
        }
    }

    /// Non-blocking readiness probe. Never triggers a deferred launch.
    pub fn is_ready(&self) -> bool {
        self.status.load(Ordering::Acquire) != UNSET
    }

    fn set_result(&self, slot: Slot<T>, status: u8) -> Result<(), Error> {
        let _span = trace_span!("task_state::OperationState::set_result").entered();
        let mut guard = self.inner.lock();
        if self.status.load(Ordering::Acquire) != UNSET {
            return Err(Error::PromiseAlreadySatisfied);
        }
        guard.slot = slot;
        // The terminal status transition is the one point that needs
        // sequential consistency rather than acquire/release: it has to
        // be globally ordered against concurrent `request_stop` and
        // `is_ready` observers on every thread.
        self.status.store(status, Ordering::SeqCst);
        self.condvar.notify_all();
        let drained = guard.continuations.take();
        drop(guard);
        for continuation in drained {
            continuation.submit();
        }
        Ok(())
    }

    pub fn set_value(&self, value: T) -> Result<(), Error> {
        self.set_result(Slot::Value(value), VALUE)
    }

    pub fn set_exception(&self, err: TaskError) -> Result<(), Error> {
        self.set_result(Slot::Exception(err), EXCEPTION)
    }

    pub fn wait(&self) {
        self.trigger_deferred();
        if self.is_ready() {
            return;
        }
        let mut guard = self.inner.lock();
        while self.status.load(Ordering::Acquire) == UNSET {
            self.condvar.wait(&mut guard);
        }
    }

    pub fn wait_for(&self, timeout: Duration) -> WaitStatus {
        self.wait_until(Instant::now() + timeout)
    }

    pub fn wait_until(&self, deadline: Instant) -> WaitStatus {
        self.trigger_deferred();
        if self.is_ready() {
            return WaitStatus::Ready;
        }
        let mut guard = self.inner.lock();
        loop {
            if self.status.load(Ordering::Acquire) != UNSET {
                return WaitStatus::Ready;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitStatus::Timeout;
            }
            let timed_out = self
                .condvar
                .wait_for(&mut guard, deadline - now)
                .timed_out();
            if timed_out && self.status.load(Ordering::Acquire) == UNSET {
                return WaitStatus::Timeout;
            }
        }
    }
}

impl<T, C: Cardinality, K: ContinuationKind> Default for OperationState<T, C, K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lets generic code (the `then`/`when_all`/`when_any` adaptors in
/// `task_future`) pull an owned `T` out of a state without caring whether
/// that meant a move (unique) or a clone (shared).
pub trait ExtractValue<T> {
    fn extract_value(&self) -> TaskResult<T>;
}

/// `get_value` for unique (non-shared) states: moves the value out,
/// transitioning to the drained status. Valid to call exactly once --
/// enforced in practice by `task_future::Future::get` consuming the
/// handle by value, so a second call can't be reached through the public
/// API.
impl<T, K: ContinuationKind> OperationState<T, Unique, K> {
    pub fn get_value(&self) -> TaskResult<T> {
        self.trigger_deferred();
        self.wait();
        let mut guard = self.inner.lock();
        let slot = guard.slot.take();
        drop(guard);
        self.status.store(DRAINED, Ordering::Release);
        match slot {
            Slot::Value(v) => Ok(v),
            Slot::Exception(e) => Err(e),
            Slot::Empty => unreachable!(
                "status left UNSET without initializing storage: invariant #2 violated"
            ),
        }
    }
}

impl<T, K: ContinuationKind> ExtractValue<T> for OperationState<T, Unique, K> {
    fn extract_value(&self) -> TaskResult<T> {
        self.get_value()
    }
}

/// `get_value` for shared states: clones the value out, leaving the slot
/// (and status) untouched so every holder observes the same result.
impl<T: Clone, K: ContinuationKind> OperationState<T, crate::options::Shared, K> {
    pub fn get_value(&self) -> TaskResult<T> {
        self.trigger_deferred();
        self.wait();
        let guard = self.inner.lock();
        match guard.slot.clone_out() {
            Some(Slot::Value(v)) => Ok(v),
            Some(Slot::Exception(e)) => Err(e),
            Some(Slot::Empty) | None => unreachable!(
                "status left UNSET without initializing storage: invariant #2 violated"
            ),
        }
    }
}

impl<T: Clone, K: ContinuationKind> ExtractValue<T> for OperationState<T, crate::options::Shared, K> {
    fn extract_value(&self) -> TaskResult<T> {
        self.get_value()
    }
}

/// `attach_continuation` only exists for states built with
/// `ContinuationKind = Continuable`: non-continuable states simply don't
/// have this method, which is the compile-time equivalent of a runtime
/// "valid only when continuable" precondition.
impl<T, C: Cardinality> OperationState<T, C, Continuable> {
    pub fn attach_continuation(&self, continuation: Continuation) {
        self.trigger_deferred();
        if self.is_ready() {
            continuation.submit();
            return;
        }
        let mut guard = self.inner.lock();
        if self.status.load(Ordering::Acquire) != UNSET {
            drop(guard);
            continuation.submit();
            return;
        }
        if let Err(continuation) = guard.continuations.push(continuation) {
            drop(guard);
            continuation.submit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{NonContinuable, Shared};
    use std::sync::Arc;
    use std::thread;
    use task_executor::{boxed, InlineExecutor};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn set_value_then_get_value_round_trips() {
        let state: OperationState<i32> = OperationState::new();
        assert!(!state.is_ready());
        state.set_value(42).unwrap();
        assert!(state.is_ready());
        assert_eq!(state.get_value().unwrap(), 42);
    }

    #[test]
    fn second_set_value_fails_with_promise_already_satisfied() {
        let state: OperationState<i32> = OperationState::new();
        state.set_value(1).unwrap();
        let err = state.set_value(2).unwrap_err();
        assert!(matches!(err, Error::PromiseAlreadySatisfied));
    }

    #[test]
    fn wait_for_zero_on_unset_state_times_out() {
        let state: OperationState<i32> = OperationState::new();
        assert_eq!(state.wait_for(Duration::from_secs(0)), WaitStatus::Timeout);
    }

    #[test]
    fn wait_for_observes_value_set_from_another_thread() {
        init_tracing();
        let state = Arc::new(OperationState::<i32>::new());
        let writer = state.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.set_value(7).unwrap();
        });
        assert_eq!(state.wait_for(Duration::from_secs(5)), WaitStatus::Ready);
        assert_eq!(state.get_value().unwrap(), 7);
        handle.join().unwrap();
    }

    #[test]
    fn exception_propagates_through_get_value() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let state: OperationState<i32> = OperationState::new();
        state.set_exception(Box::new(Boom)).unwrap();
        let err = state.get_value().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn shared_state_allows_repeated_get_value() {
        let state: OperationState<i32, Shared> = OperationState::new();
        state.set_value(9).unwrap();
        assert_eq!(state.get_value().unwrap(), 9);
        assert_eq!(state.get_value().unwrap(), 9);
    }

    #[test]
    fn attach_continuation_before_ready_runs_after_set_value() {
        let state: OperationState<i32> = OperationState::new();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran2 = ran.clone();
        state.attach_continuation(Continuation::new(
            boxed(InlineExecutor::new()),
            Box::new(move || ran2.store(true, Ordering::SeqCst)),
        ));
        assert!(!ran.load(Ordering::SeqCst));
        state.set_value(1).unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn attach_continuation_after_ready_runs_immediately() {
        let state: OperationState<i32> = OperationState::new();
        state.set_value(1).unwrap();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran2 = ran.clone();
        state.attach_continuation(Continuation::new(
            boxed(InlineExecutor::new()),
            Box::new(move || ran2.store(true, Ordering::SeqCst)),
        ));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn non_continuable_state_has_no_attach_continuation_method() {
        // Compile-time check: `OperationState<i32, Unique, NonContinuable>`
        // simply has no `attach_continuation` -- this test just exercises
        // the rest of its API to make sure the type still works without
        // that facet.
        let state: OperationState<i32, Unique, NonContinuable> = OperationState::new();
        state.set_value(5).unwrap();
        assert_eq!(state.get_value().unwrap(), 5);
    }

    #[test]
    fn request_stop_is_noop_once_ready() {
        let state: OperationState<i32> = OperationState::with_stop_source(StopSource::new());
        state.set_value(1).unwrap();
        assert!(!state.request_stop());
        assert!(!state.stop_token().unwrap().stop_requested());
    }

    #[test]
    fn request_stop_before_ready_transitions_token() {
        let state: OperationState<i32> = OperationState::with_stop_source(StopSource::new());
        let token = state.stop_token().unwrap();
        assert!(state.request_stop());
        assert!(token.stop_requested());
    }
}
