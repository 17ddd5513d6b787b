use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use task_executor::boxed;
use task_executor::InlineExecutor;
use task_state::{Cardinality, Continuable, Continuation, OperationState, Unique};

use crate::future::Future;

/// The value produced by `when_all`: the same futures that were joined,
/// each now observably ready.
///
/// Inputs must be built with `ContinuationKind = Continuable` -- `when_all`
/// is implemented entirely via `attach_continuation`, which a
/// `NonContinuable` state simply doesn't have, so passing one is a
/// compile error rather than a runtime one.
pub struct WhenAllResult<Tuple> {
    pub futures: Tuple,
}

impl<Tuple> WhenAllResult<Tuple> {
    /// Mode (b) of the signature-matching rules `then` applies to a
    /// `WhenAllResult` antecedent: the whole tuple of ready futures,
    /// still as futures (callers `.get()` each themselves).
    pub fn into_tuple(self) -> Tuple {
        self.futures
    }
}

fn inline_executor() -> task_executor::BoxExecutor {
    boxed(InlineExecutor::new())
}

/// Registers the shared "one fewer input outstanding" bookkeeping on a
/// single input. When the last input reports in, the tuple held in
/// `tuple_holder` (already complete -- every input was captured by value
/// at `when_all` construction time) becomes the aggregate's value.
fn register_join<T, C, Tuple>(
    input: Arc<OperationState<T, C, Continuable>>,
    aggregate: Arc<OperationState<WhenAllResult<Tuple>, Unique, Continuable>>,
    tuple_holder: Arc<Mutex<Option<Tuple>>>,
    remaining: Arc<AtomicUsize>,
) where
    T: Send + 'static,
    C: Cardinality,
    Tuple: Send + 'static,
{
    input.attach_continuation(Continuation::new(
        inline_executor(),
        Box::new(move || {
            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                if let Some(tuple) = tuple_holder.lock().take() {
                    let _ = aggregate.set_value(WhenAllResult { futures: tuple });
                }
            }
        }),
    ));
}

/// Generates a fixed-arity `when_allN` function. One macro expansion per
/// tuple width rather than 3-4 hand-copied functions -- the body is
/// identical for every arity, only the tuple width changes.
///
/// Stops at 5: small fixed arities cover the common tuple-join call
/// sites directly, and `when_all_vec` below covers any width for the
/// homogeneous case.
macro_rules! when_all_arity {
    (
        $(#[$meta:meta])*
        $name:ident,
        ($($T:ident),+ $(,)?),
        ($($C:ident),+ $(,)?),
        ($($f:ident),+ $(,)?),
        ($($state:ident),+ $(,)?),
        ($($kick:ident),+ $(,)?),
        $count:expr
    ) => {
        $(#[$meta])*
        pub fn $name<$($T,)+ $($C,)+>(
            $($f: Future<$T, $C, Continuable>,)+
        ) -> Future<WhenAllResult<($(Future<$T, $C, Continuable>,)+)>, Unique, Continuable>
        where
            $($T: Send + 'static,)+
            $($C: Cardinality,)+
        {
            let aggregate: Arc<
                OperationState<WhenAllResult<($(Future<$T, $C, Continuable>,)+)>, Unique, Continuable>,
            > = Arc::new(OperationState::new());
            let remaining = Arc::new(AtomicUsize::new($count));

            $(let $state = $f.state_arc().expect("input future must be valid");)+

            $(let $kick = $state.clone();)+
            aggregate.set_deferred_trigger(Box::new(move || {
                $($kick.kick();)+
            }));

            let tuple_holder = Arc::new(Mutex::new(Some(($($f,)+))));
            $(register_join($state, aggregate.clone(), tuple_holder.clone(), remaining.clone());)+

            Future::from_state(aggregate)
        }
    };
}

when_all_arity!(
    /// Joins two futures into one future of a `WhenAllResult` tuple.
    when_all2,
    (TA, TB),
    (CA, CB),
    (fa, fb),
    (state_a, state_b),
    (kick_a, kick_b),
    2
);

when_all_arity!(
    /// Joins three futures into one future of a `WhenAllResult` tuple.
    when_all3,
    (TA, TB, TC),
    (CA, CB, CC),
    (fa, fb, fc),
    (state_a, state_b, state_c),
    (kick_a, kick_b, kick_c),
    3
);

when_all_arity!(
    /// Joins four futures into one future of a `WhenAllResult` tuple.
    when_all4,
    (TA, TB, TC, TD),
    (CA, CB, CC, CD),
    (fa, fb, fc, fd),
    (state_a, state_b, state_c, state_d),
    (kick_a, kick_b, kick_c, kick_d),
    4
);

when_all_arity!(
    /// Joins five futures into one future of a `WhenAllResult` tuple.
    when_all5,
    (TA, TB, TC, TD, TE),
    (CA, CB, CC, CD, CE),
    (fa, fb, fc, fd, fe),
    (state_a, state_b, state_c, state_d, state_e),
    (kick_a, kick_b, kick_c, kick_d, kick_e),
    5
);

/// The homogeneous form: joins a `Vec` of same-typed futures into one
/// future of a `WhenAllResult<Vec<Future<T, C, Continuable>>>`.
pub fn when_all_vec<T, C>(
    futures: Vec<Future<T, C, Continuable>>,
) -> Future<WhenAllResult<Vec<Future<T, C, Continuable>>>, Unique, Continuable>
where
    T: Send + 'static,
    C: Cardinality,
{
    let aggregate: Arc<OperationState<WhenAllResult<Vec<Future<T, C, Continuable>>>, Unique, Continuable>> =
        Arc::new(OperationState::new());

    if futures.is_empty() {
        aggregate
            .set_value(WhenAllResult { futures })
            .expect("freshly constructed state is unset");
        return Future::from_state(aggregate);
    }

    let remaining = Arc::new(AtomicUsize::new(futures.len()));
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
    for state in states {
        register_join(state, aggregate.clone(), tuple_holder.clone(), remaining.clone());
    }

    Future::from_state(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ready::make_ready_future;

    #[test]
    fn when_all5_waits_for_every_input() {
        let joined = when_all5(
            make_ready_future(1),
            make_ready_future(2),
            make_ready_future(3),
            make_ready_future(4),
            make_ready_future(5),
        )
        .get()
        .unwrap();
        let (a, b, c, d, e) = joined.into_tuple();
        let total = a.get().unwrap()
            + b.get().unwrap()
            + c.get().unwrap()
            + d.get().unwrap()
            + e.get().unwrap();
        assert_eq!(total, 15);
    }

    #[test]
    fn when_all_vec_of_empty_input_is_immediately_ready() {
        let joined: WhenAllResult<Vec<Future<i32, Unique, Continuable>>> =
            when_all_vec(Vec::new()).get().unwrap();
        assert!(joined.futures.is_empty());
    }
}
