use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use task_executor::boxed;
use task_executor::InlineExecutor;
use task_state::{Cardinality, Continuable, Continuation, OperationState, Unique};

use crate::future::Future;

const NO_WINNER: usize = usize::MAX;

/// The value produced by `when_any`: the index of the first input to
/// complete, plus every input future (the losers are retained, still
/// live, so the caller can keep waiting on them).
pub struct WhenAnyResult<Tuple> {
    pub index: usize,
    pub futures: Tuple,
}

impl<Tuple> WhenAnyResult<Tuple> {
    pub fn into_tuple(self) -> (usize, Tuple) {
        (self.index, self.futures)
    }
}

fn inline_executor() -> task_executor::BoxExecutor {
    boxed(InlineExecutor::new())
}

/// Registers the one-shot latch on a single input: the first input whose
/// callback wins the compare-exchange on `winner` takes the (still
/// complete) tuple out of `tuple_holder` and sets the aggregate. Every
/// later callback finds `winner` already set and does nothing.
fn register_race<T, C, Tuple>(
    index: usize,
    input: Arc<OperationState<T, C, Continuable>>,
    aggregate: Arc<OperationState<WhenAnyResult<Tuple>, Unique, Continuable>>,
    tuple_holder: Arc<Mutex<Option<Tuple>>>,
    winner: Arc<AtomicUsize>,
) where
    T: Send + 'static,
    C: Cardinality,
    Tuple: Send + 'static,
{
    input.attach_continuation(Continuation::new(
        inline_executor(),
        Box::new(move || {
            if winner
                .compare_exchange(NO_WINNER, index, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if let Some(tuple) = tuple_holder.lock().take() {
                    let _ = aggregate.set_value(WhenAnyResult { index, futures: tuple });
                }
            }
        }),
    ));
}

/// Generates a fixed-arity `when_anyN` function, the `when_all` macro's
/// counterpart for disjunction. Every deferred input is launched as soon
/// as the aggregate itself is first waited on, rather than probing inputs
/// sequentially: launching all of them preserves disjunction semantics
/// even when more than one input would otherwise have completed first.
///
/// Stops at 5, same precedent as `when_all_arity!`.
macro_rules! when_any_arity {
    (
        $(#[$meta:meta])*
        $name:ident,
        ($($T:ident),+ $(,)?),
        ($($C:ident),+ $(,)?),
        ($($f:ident),+ $(,)?),
        ($($state:ident),+ $(,)?),
        ($($kick:ident),+ $(,)?),
        ($($idx:expr),+ $(,)?)
    ) => {
        $(#[$meta])*
        pub fn $name<$($T,)+ $($C,)+>(
            $($f: Future<$T, $C, Continuable>,)+
        ) -> Future<WhenAnyResult<($(Future<$T, $C, Continuable>,)+)>, Unique, Continuable>
        where
            $($T: Send + 'static,)+
            $($C: Cardinality,)+
        {
            let aggregate: Arc<
                OperationState<WhenAnyResult<($(Future<$T, $C, Continuable>,)+)>, Unique, Continuable>,
            > = Arc::new(OperationState::new());
            let winner = Arc::new(AtomicUsize::new(NO_WINNER));

            $(let $state = $f.state_arc().expect("input future must be valid");)+

            $(let $kick = $state.clone();)+
            aggregate.set_deferred_trigger(Box::new(move || {
                $($kick.kick();)+
            }));

            let tuple_holder = Arc::new(Mutex::new(Some(($($f,)+))));
            $(register_race($idx, $state, aggregate.clone(), tuple_holder.clone(), winner.clone());)+

            Future::from_state(aggregate)
        }
    };
}

when_any_arity!(
    /// Races two futures; the first to complete wins.
    when_any2,
    (TA, TB),
    (CA, CB),
    (fa, fb),
    (state_a, state_b),
    (kick_a, kick_b),
    (0, 1)
);

when_any_arity!(
    /// Races three futures; the first to complete wins.
    when_any3,
    (TA, TB, TC),
    (CA, CB, CC),
    (fa, fb, fc),
    (state_a, state_b, state_c),
    (kick_a, kick_b, kick_c),
    (0, 1, 2)
);

when_any_arity!(
    /// Races four futures; the first to complete wins.
    when_any4,
    (TA, TB, TC, TD),
    (CA, CB, CC, CD),
    (fa, fb, fc, fd),
    (state_a, state_b, state_c, state_d),
    (kick_a, kick_b, kick_c, kick_d),
    (0, 1, 2, 3)
);

when_any_arity!(
    /// Races five futures; the first to complete wins.
    when_any5,
    (TA, TB, TC, TD, TE),
    (CA, CB, CC, CD, CE),
    (fa, fb, fc, fd, fe),
    (state_a, state_b, state_c, state_d, state_e),
    (kick_a, kick_b, kick_c, kick_d, kick_e),
    (0, 1, 2, 3, 4)
);

/// The homogeneous form: races a `Vec` of same-typed futures.
pub fn when_any_vec<T, C>(
    futures: Vec<Future<T, C, Continuable>>,
) -> Future<WhenAnyResult<Vec<Future<T, C, Continuable>>>, Unique, Continuable>
where
    T: Send + 'static,
    C: Cardinality,
{
    let aggregate: Arc<OperationState<WhenAnyResult<Vec<Future<T, C, Continuable>>>, Unique, Continuable>> =
        Arc::new(OperationState::new());
    assert!(!futures.is_empty(), "when_any_vec requires at least one input");

    let winner = Arc::new(AtomicUsize::new(NO_WINNER));
    let states: Vec<_> = futures
        .iter()
        .map(|f| f.state_arc().expect("input future must be valid"))
        .collect();

    let states_for_trigger = states.clone();
    aggregate.set_deferred_trigger(Box::new(move || {
        for state in &states_for_trigger {
            state.kick();
        }
    }));

    let tuple_holder = Arc::new(Mutex::new(Some(futures)));
    for (index, state) in states.into_iter().enumerate() {
        register_race(index, state, aggregate.clone(), tuple_holder.clone(), winner.clone());
    }

    Future::from_state(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::make_deferred_future;
    use task_executor::{boxed as box_executor, InlineExecutor};

    #[test]
    fn when_any5_picks_the_only_input_that_ever_completes() {
        let a = make_deferred_future(box_executor(InlineExecutor::new()), None, |_| 1);
        let b = make_deferred_future(box_executor(InlineExecutor::new()), None, |_| 2);
        let c = make_deferred_future(box_executor(InlineExecutor::new()), None, |_| 3);
        let d = make_deferred_future(box_executor(InlineExecutor::new()), None, |_| 4);
        let e = make_deferred_future(box_executor(InlineExecutor::new()), None, |_| 5);

        let result = when_any5(a, b, c, d, e).get().unwrap();
        assert!(result.index < 5);
    }
}
