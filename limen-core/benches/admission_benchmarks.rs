//! Benchmarks for the admission hot path.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use limen::{
    AdmissionEngine, Amount, ExecutorId, ExecutorRegistry, LedgerStore, ManualClock, PrincipalId,
    ResourceId,
};

fn setup() -> AdmissionEngine {
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let store = Arc::new(LedgerStore::new(clock));
    let registry = Arc::new(ExecutorRegistry::new());
    registry.register(ExecutorId::from("executor"));
    // Ceilings high enough that the bench loop never exhausts them.
    store
        .activate(&PrincipalId::from("alice"), Amount::MAX / 2, Amount::MAX / 2)
        .unwrap();
    store
        .set_limit(
            &PrincipalId::from("alice"),
            &ResourceId::from("usdc"),
            Amount::MAX / 2,
        )
        .unwrap();
    AdmissionEngine::new(store, registry)
}

fn benchmark_check_only(c: &mut Criterion) {
    let engine = setup();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    c.bench_function("admission_check_only", |b| {
        b.iter(|| {
            engine
                .check_only(black_box(&alice), black_box(&usdc), 100, 1_700_000_000)
                .unwrap()
        })
    });
}

fn benchmark_record_debit(c: &mut Criterion) {
    let engine = setup();
    let executor = ExecutorId::from("executor");
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    c.bench_function("admission_record_debit", |b| {
        b.iter(|| {
            engine
                .record_debit(black_box(&executor), &alice, &usdc, 1)
                .unwrap()
        })
    });

    c.bench_function("admission_record_debit_rejected", |b| {
        b.iter(|| {
            engine
                .record_debit(&ExecutorId::from("rogue"), &alice, &usdc, 1)
                .unwrap_err()
        })
    });
}

criterion_group!(benches, benchmark_check_only, benchmark_record_debit);
criterion_main!(benches);
