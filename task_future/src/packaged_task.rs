use task_state::{Continuable, Error, TaskError, TaskResult, Unique};

use crate::future::Future;
use crate::panic_guard::catch_to_task_error;
use crate::promise::Promise;

/// A callable wrapper bound to a promise: invoking it (once) runs the
/// stored callable and routes its result or panic into the promise's
/// state.
///
/// The callable's arguments are taken as a single tuple `Args` rather than
/// modeled as a true Rust-level variadic (stable Rust has no public
/// `Fn<Args>` sugar to build on) -- `invoke(())` for a nullary task,
/// `invoke((a, b))` for a binary one, and so on.
pub struct PackagedTask<Args, R> {
    task: Option<Box<dyn FnOnce(Args) -> R + Send>>,
    promise: Promise<R, Unique, Continuable>,
}

impl<Args, R: Send + 'static> PackagedTask<Args, R> {
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Args) -> R + Send + 'static,
    {
        Self {
            task: Some(Box::new(task)),
            promise: Promise::new(),
        }
    }

    pub fn get_future(&mut self) -> TaskResult<Future<R, Unique, Continuable>> {
        self.promise.get_future()
    }

    pub fn valid(&self) -> bool {
        self.task.is_some()
    }

    /// Runs the stored callable with `args`, consuming the task. Calling
    /// this on an already-invoked (or reset-without-task) `PackagedTask`
    /// returns `Error::PackagedTaskUninitialized` instead of panicking.
    pub fn invoke(&mut self, args: Args) -> TaskResult<()> {
        let Some(task) = self.task.take() else {
            return Err(Box::new(Error::PackagedTaskUninitialized) as TaskError);
        };
        match catch_to_task_error(move || task(args)) {
            Ok(value) => self.promise.set_value(value),
            Err(err) => self.promise.set_exception(err),
        }
    }

    /// Discards any pending task and rebinds a fresh one with a brand new
    /// promise/future pair, so the task can be run again independently of
    /// whoever already retrieved the previous future.
    pub fn reset<F>(&mut self, task: F)
    where
        F: FnOnce(Args) -> R + Send + 'static,
    {
        self.task = Some(Box::new(task));
        self.promise = Promise::new();
    }
}
