use task_executor::BoxExecutor;

/// A continuation registered on an operation state: an executor to submit
/// to, plus an already-erased callback.
///
/// The callback takes no arguments. Rather than have the state machine
/// understand how to extract `T` out of its own slot (move for a unique
/// state, clone for a shared one) and hand it to the continuation, the
/// closure itself captures a clone of the antecedent's `Arc` and pulls the
/// result out when it runs -- it already knows, at construction time,
/// whether its antecedent is shared or unique. The type erasure happens
/// one level up, in `task_future`, where the callback is built.
pub struct Continuation {
    pub executor: BoxExecutor,
    pub callback: Box<dyn FnOnce() + Send + 'static>,
}

impl Continuation {
    pub fn new(executor: BoxExecutor, callback: Box<dyn FnOnce() + Send + 'static>) -> Self {
        Self { executor, callback }
    }

    /// Hands the callback off to its executor.
    pub fn submit(self) {
        let Continuation { executor, callback } = self;
        executor.execute(callback);
    }
}

/// Storage strategy for a state's continuation list, selected at compile
/// time by [`crate::options::ContinuationKind`].
///
/// `push`/`take` are called with the state's main lock already held, so
/// implementations need no internal synchronization of their own.
pub trait ContinuationSlot: Default + Send {
    /// Appends `continuation`. Returns it back in `Err` if the list has
    /// already been drained (the state became ready and continuations
    /// were already snapshotted) -- the caller submits it directly in
    /// that case instead of losing it.
    fn push(&mut self, continuation: Continuation) -> Result<(), Continuation>;

    /// Snapshots and clears the list. Idempotent: calling it again after
    /// the first drain returns an empty vector.
    fn take(&mut self) -> Vec<Continuation>;
}

/// The continuation list for a state built with `Opts.continuable = false`.
/// Zero-sized; every method is a no-op, so the "continuations" facet costs
/// nothing when the future was never meant to support `.then()`.
#[derive(Default)]
pub struct NoContinuations;

impl ContinuationSlot for NoContinuations {
    fn push(&mut self, continuation: Continuation) -> Result<(), Continuation> {
        Err(continuation)
    }

    fn take(&mut self) -> Vec<Continuation> {
        Vec::new()
    }
}

/// The continuation list for a continuable state: an append-only `Vec`
/// until the first drain, `None` (meaning "already drained") afterward.
pub struct WithContinuations {
    list: Option<Vec<Continuation>>,
}

impl Default for WithContinuations {
    fn default() -> Self {
        Self {
            list: Some(Vec::new()),
        }
    }
}

impl ContinuationSlot for WithContinuations {
    fn push(&mut self, continuation: Continuation) -> Result<(), Continuation> {
        match &mut self.list {
            Some(list) => {
                list.push(continuation);
                Ok(())
            }
            None => Err(continuation),
        }
    }

    fn take(&mut self) -> Vec<Continuation> {
        self.list.take().unwrap_or_default()
    }
}
