use criterion::{criterion_group, criterion_main, Criterion};
use task_future::make_ready_future;

fn chain_of(depth: usize) -> i32 {
    let mut future = make_ready_future(0);
    for _ in 0..depth {
        future = future.then(|x| x + 1).unwrap();
    }
    future.get().unwrap()
}

fn bench_then_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("then_chain");
    for depth in [1usize, 8, 64] {
        group.bench_with_input(format!("depth_{depth}"), &depth, |b, &depth| {
            b.iter(|| chain_of(depth));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_then_chain);
criterion_main!(benches);
