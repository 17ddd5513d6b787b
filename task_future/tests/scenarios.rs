use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use task_executor::{boxed, InlineExecutor};
use task_future::{
    make_deferred_future, make_ready_future, when_all3, when_any2, Promise, StopSource,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn eager_value_is_ready_immediately() {
    init_tracing();
    let future = make_ready_future(42);
    assert!(future.is_ready().unwrap());
    assert_eq!(future.get().unwrap(), 42);
}

#[test]
fn deferred_value_runs_exactly_once_on_first_demand() {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_for_task = runs.clone();
    let future = make_deferred_future(boxed(InlineExecutor::new()), None, move |_stop| {
        runs_for_task.fetch_add(1, Ordering::SeqCst);
        7
    });

    assert!(!future.is_ready().unwrap());
    assert_eq!(future.get().unwrap(), 7);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn cooperative_cancellation_loop_observes_request_stop() {
    let mut promise: Promise<&'static str> = Promise::with_stop_source(StopSource::new());
    let stop_token = promise.stop_token().unwrap();
    let future = promise.get_future().unwrap();

    let worker = thread::spawn(move || {
        loop {
            if stop_token.stop_requested() {
                promise.set_value("cancelled").unwrap();
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
    });

    // Give the worker a moment to enter its poll loop before cancelling.
    thread::sleep(Duration::from_millis(20));
    assert!(future.request_stop().unwrap());
    worker.join().unwrap();

    assert_eq!(future.get().unwrap(), "cancelled");
}

#[test]
fn continuation_chain_doubles_the_antecedent_value() {
    let future = make_ready_future(2).then(|x| x * 2).unwrap();
    assert_eq!(future.get().unwrap(), 4);
}

#[test]
fn then_propagates_antecedent_exception_without_calling_f() {
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, thiserror::Error)]
    #[error("antecedent failed")]
    struct Boom;

    let called = Arc::new(AtomicBool::new(false));
    let called_for_closure = called.clone();
    let future = task_future::make_exceptional_future::<i32>(Box::new(Boom))
        .then(move |v| {
            called_for_closure.store(true, Ordering::SeqCst);
            v * 2
        })
        .unwrap();

    let err = future.get().unwrap_err();
    assert_eq!(err.to_string(), "antecedent failed");
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn when_all_tuple_unwraps_into_a_combined_value() {
    let a = make_ready_future(2);
    let b = make_ready_future(3.5_f64);
    let c = make_ready_future("abcde".to_string());

    let joined = when_all3(a, b, c).get().unwrap();
    let (fa, fb, fc) = joined.into_tuple();

    let total = fa.get().unwrap() + fb.get().unwrap() as i32 + fc.get().unwrap().len() as i32;
    assert_eq!(total, 10);
}

#[test]
fn when_any_disjunction_picks_the_first_to_complete() {
    let fast = make_deferred_future(boxed(InlineExecutor::new()), None, |_| "fast");
    let slow = make_deferred_future(boxed(InlineExecutor::new()), None, |_| {
        thread::sleep(Duration::from_millis(30));
        "slow"
    });

    let result = when_any2(fast, slow).get().unwrap();
    assert_eq!(result.index, 0);
    let (winner, _loser) = (result.futures.0, result.futures.1);
    assert_eq!(winner.get().unwrap(), "fast");
}

#[test]
fn detaching_a_future_still_lets_the_deferred_task_run() {
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_for_task = ran.clone();
    let future = make_deferred_future(boxed(InlineExecutor::new()), None, move |_| {
        ran_for_task.fetch_add(1, Ordering::SeqCst);
    });

    future.detach().unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn share_allows_multiple_holders_to_read_the_same_value() {
    let shared = make_ready_future(99).share().unwrap();
    let other = shared.clone();

    assert_eq!(shared.get().unwrap(), 99);
    assert_eq!(other.get().unwrap(), 99);
}
