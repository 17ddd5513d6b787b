//! Executor abstraction consumed by the operation-state machine.
//!
//! The runtime never implements its own scheduler; it only needs
//! something that can accept a nullary task and run it eventually. This
//! crate provides the trait, a type-erased handle to it, and the two
//! concrete executors the core requires: a thread-pool executor (the
//! default) and an inline executor that runs synchronously on the
//! submitting thread.

pub mod inline;
pub mod park;
pub mod thread_pool;

use std::sync::Arc;

pub use inline::InlineExecutor;
pub use thread_pool::{ThreadPoolExecutor, ThreadPoolExecutorBuilder};

/// A boxed nullary task ready for submission to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can accept a nullary task and arrange for it to run.
///
/// `execute` must not throw (panic) on submission of a well-formed task
/// and must not block the calling thread waiting for the task to finish
/// -- only for the act of handing it off.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job);
}

impl<F> Executor for F
where
    F: Fn(Job) + Send + Sync + 'static,
{
    fn execute(&self, job: Job) {
        (self)(job)
    }
}

/// A type-erased, cheaply-cloneable handle to an executor.
///
/// Operation states and continuation lists store this rather than being
/// generic over a concrete executor type: the set of continuations
/// attached to a single future can legitimately target different
/// executors, so the executor type itself cannot be a type parameter of
/// the state.
pub type BoxExecutor = Arc<dyn Executor>;

/// Wraps any [`Executor`] as a [`BoxExecutor`].
pub fn boxed<E: Executor>(executor: E) -> BoxExecutor {
    Arc::new(executor)
}

/// The process-wide default executor: a thread pool sized to
/// `std::thread::available_parallelism()`, created lazily on first use.
///
/// This is the executor `then`/`when_all`/`when_any` fall back to when no
/// explicit executor is given.
pub fn default_executor() -> BoxExecutor {
    use std::sync::OnceLock;
    static DEFAULT: OnceLock<BoxExecutor> = OnceLock::new();
    DEFAULT
        .get_or_init(|| boxed(ThreadPoolExecutor::builder().build()))
        .clone()
}
