#![cfg(loom)]

//! `OperationState` itself is built on `parking_lot`, which loom cannot
//! model, so this exercises the status compare-exchange in isolation: the
//! same UNSET -> terminal transition `OperationState::set_result` performs
//! under its mutex, reduced to a bare atomic so loom can explore every
//! interleaving of concurrent writers.

use loom::sync::atomic::{AtomicU8, Ordering};
use loom::sync::Arc;

const UNSET: u8 = 0;
const SET: u8 = 1;

#[test]
fn exactly_one_of_two_concurrent_transitions_wins() {
    loom::model(|| {
        let status = Arc::new(AtomicU8::new(UNSET));
        let wins = Arc::new(AtomicU8::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let status = status.clone();
            let wins = wins.clone();
            handles.push(loom::thread::spawn(move || {
                if status
                    .compare_exchange(UNSET, SET, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(status.load(Ordering::SeqCst), SET);
    });
}
