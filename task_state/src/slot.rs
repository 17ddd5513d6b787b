use crate::error::TaskError;

/// Storage for the value or exception of an operation state.
///
/// A single enum covers void, trivial, and non-trivial `T` uniformly:
/// `Slot<T>` already gives the uninitialized/initialized distinction for
/// any `T` — including `T = ()` — at zero cost, because moving out of an
/// enum variant is exactly as cheap as moving out of a raw field. There is
/// no reference-typed variant: any value that must cross an executor
/// boundary needs `'static` ownership, so shared futures clone out of the
/// slot instead (see `Options::Shared`).
#[derive(Debug)]
pub enum Slot<T> {
    /// No value has been written yet.
    Empty,
    /// The task completed successfully.
    Value(T),
    /// The task failed.
    Exception(TaskError),
}

impl<T> Slot<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// Moves the value or exception out, leaving `Empty` behind.
    ///
    /// Used by non-shared (unique) futures: `get_value` is only callable
    /// once, and the second call observes `Empty` again (callers must
    /// check `status` before calling this).
    pub fn take(&mut self) -> Slot<T> {
        std::mem::replace(self, Slot::Empty)
    }
}

impl<T: Clone> Slot<T> {
    /// Reads the value or exception by reference and clones it out,
    /// leaving the slot intact. Used by shared futures, where multiple
    /// holders must all be able to observe the same result.
    pub fn clone_out(&self) -> Option<Slot<T>>
    where
        T: Clone,
    {
        match self {
            Slot::Empty => None,
            Slot::Value(v) => Some(Slot::Value(v.clone())),
            Slot::Exception(e) => Some(Slot::Exception(clone_task_error(e))),
        }
    }
}

/// `TaskError` is `Box<dyn Error>`, which isn't `Clone`; we only need its
/// display text to reappear for every shared holder, not its original type,
/// so re-box the formatted message.
fn clone_task_error(err: &TaskError) -> TaskError {
    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct ClonedError(String);

    Box::new(ClonedError(err.to_string()))
}
