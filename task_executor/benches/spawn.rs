use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use criterion::{criterion_group, criterion_main, Criterion};
use task_executor::{Executor, ThreadPoolExecutor};

fn spawn_and_wait(pool: &ThreadPoolExecutor, n: usize) {
    let done = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(n + 1));

    for _ in 0..n {
        let done = done.clone();
        let barrier = barrier.clone();
        pool.execute(Box::new(move || {
            done.fetch_add(1, Ordering::Relaxed);
            barrier.wait();
        }));
    }

    barrier.wait();
    assert_eq!(done.load(Ordering::Relaxed), n);
}

fn bench_spawn(c: &mut Criterion) {
    let pool = ThreadPoolExecutor::new(4);

    let mut group = c.benchmark_group("thread_pool_spawn");
    for n in [1usize, 8, 64, 512] {
        group.bench_with_input(format!("{n}_jobs"), &n, |b, &n| {
            b.iter(|| spawn_and_wait(&pool, n));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_spawn);
criterion_main!(benches);
