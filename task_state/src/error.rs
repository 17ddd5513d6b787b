/// A boxed error captured from a task body or continuation.
///
/// Task and continuation bodies may fail with any error type; the state
/// machine only needs to move it around and hand it back, so it is stored
/// type-erased behind this alias rather than threading an error generic
/// through every component.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the operation-state machine and its handles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The producer (promise, packaged task, or deferred launch) was
    /// dropped before setting a value or exception, and the state was not
    /// `always_detached`.
    #[error("broken promise")]
    BrokenPromise,
    /// `get_future` (or the moral equivalent) was called twice on the same
    /// promise/packaged task.
    #[error("future already retrieved")]
    FutureAlreadyRetrieved,
    /// `set_value`/`set_exception` was called on a state that had already
    /// left the unset status.
    #[error("promise already satisfied")]
    PromiseAlreadySatisfied,
    /// The promise holder has no associated state (default-constructed or
    /// already moved from).
    #[error("promise has no state")]
    PromiseUninitialized,
    /// The packaged task holder has no associated state.
    #[error("packaged task has no state")]
    PackagedTaskUninitialized,
    /// The future holder has no associated state.
    #[error("future has no state")]
    FutureUninitialized,
    /// The operation requested is not valid on a deferred future that has
    /// not yet been launched (e.g. a non-blocking readiness query the
    /// implementation chose to reject before launch).
    #[error("operation invalid on a deferred future")]
    FutureDeferred,
}

impl Error {
    /// Whether this error corresponds to "no associated state" in any of
    /// its holder-specific forms.
    pub fn is_no_state(&self) -> bool {
        matches!(
            self,
            Error::PromiseUninitialized
                | Error::PackagedTaskUninitialized
                | Error::FutureUninitialized
        )
    }
}

/// The outcome of a `get_value`: either the value, or a task-body error.
///
/// Kept distinct from `Result<T, Error>` because a task failure and a
/// state-machine protocol violation are different kinds of failure; a
/// protocol violation ([`Error`]) never carries a task's own error type.
pub type TaskResult<T> = Result<T, TaskError>;
