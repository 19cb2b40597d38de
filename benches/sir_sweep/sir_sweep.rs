use criterion::{criterion_group, criterion_main, Criterion};
use sir_ro::continuous::run_model;
use sir_ro::discrete::run_discrete_model;
use sir_ro::parameters::{ContinuousParameters, DiscreteParameters};
use sir_ro::verification::run_verifications;

pub fn criterion_benchmark(c: &mut Criterion) {
    let continuous = ContinuousParameters::default();
    c.bench_function("continuous R0 sweep", |bencher| {
        bencher.iter_with_large_drop(|| run_model(&continuous).expect("sweep failed"));
    });

    c.bench_function("verification runs", |bencher| {
        bencher.iter_with_large_drop(|| {
            run_verifications(&continuous).expect("verification failed")
        });
    });

    let discrete = DiscreteParameters {
        days: 10_000,
        ..DiscreteParameters::default()
    };
    let initial = discrete.initial_state();
    c.bench_function("discrete model 10k days", |bencher| {
        bencher.iter_with_large_drop(|| run_discrete_model(&initial, &discrete));
    });
}

criterion_group!(sir_benches, criterion_benchmark);
criterion_main!(sir_benches);
