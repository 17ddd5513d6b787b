#![cfg(loom)]

use task_executor::park::Parker;

#[test]
fn smoke() {
    loom::model(|| {
        let parker = Parker::new();
        let unparker = parker.clone();

        loom::thread::spawn(move || {
            parker.park();
        });

        unparker.unpark();
    });
}

#[test]
fn unpark_before_park_still_wakes() {
    loom::model(|| {
        let parker = Parker::new();
        let unparker = parker.clone();

        unparker.unpark();

        let handle = loom::thread::spawn(move || {
            parker.park();
        });

        handle.join().unwrap();
    });
}
