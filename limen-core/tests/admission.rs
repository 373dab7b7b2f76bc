//! End-to-end admission flows: activation, the ordered check tiers, and
//! the no-partial-commit guarantee on every rejection path.

use std::sync::Arc;

use limen::{
    AdmissionEngine, Amount, Clock, ErrorKind, ExecutorId, ExecutorRegistry, LedgerStore,
    ManualClock,
    PrincipalId, Remaining, ResourceId,
};

const NOW: u64 = 1_700_000_000;

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<LedgerStore>,
    engine: AdmissionEngine,
    executor: ExecutorId,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(NOW));
    let store = Arc::new(LedgerStore::new(clock.clone()));
    let registry = Arc::new(ExecutorRegistry::new());
    let executor = ExecutorId::from("dca-executor");
    registry.register(executor.clone());
    Harness {
        clock,
        store: store.clone(),
        engine: AdmissionEngine::new(store, registry),
        executor,
    }
}

#[test]
fn scenario_a_activate_then_debit() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 1_000, 100).unwrap();

    let receipt = h.engine.record_debit(&h.executor, &alice, &usdc, 100).unwrap();
    assert_eq!(receipt.spent_today, 100);
    assert_eq!(h.store.remaining(&alice, NOW), 900);
}

#[test]
fn scenario_b_daily_limit_isolated_from_single_tx() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    // Per-call ceiling equal to the daily ceiling so only the aggregate
    // tier can fire.
    h.store.activate(&alice, 1_000, 1_000).unwrap();
    h.engine.record_debit(&h.executor, &alice, &usdc, 100).unwrap();

    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, 950)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsDailyLimit);
    assert!(err.to_string().contains("900"), "reason names the remainder: {err}");

    // The rejected call consumed nothing.
    assert_eq!(h.store.remaining(&alice, NOW), 900);
    assert_eq!(h.engine.record_debit(&h.executor, &alice, &usdc, 900).unwrap().spent_today, 1_000);
}

#[test]
fn scenario_c_emergency_blocks_and_clears() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 1_000, 100).unwrap();
    h.store.set_emergency(&alice, true).unwrap();

    for amount in [1, 100] {
        let err = h
            .engine
            .record_debit(&h.executor, &alice, &usdc, amount)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmergencyActive);
    }
    assert_eq!(
        h.engine.check_only(&alice, &usdc, 1, NOW).unwrap_err().kind(),
        ErrorKind::EmergencyActive
    );

    h.store.set_emergency(&alice, false).unwrap();
    assert!(h.engine.record_debit(&h.executor, &alice, &usdc, 100).is_ok());
}

#[test]
fn scenario_d_unregistered_executor_changes_nothing() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 1_000, 100).unwrap();
    let before = h.store.policy(&alice).unwrap();

    let err = h
        .engine
        .record_debit(&ExecutorId::from("rogue"), &alice, &usdc, 100)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let after = h.store.policy(&alice).unwrap();
    assert_eq!(before, after, "unauthorized call must not touch state");
}

#[test]
fn boundary_amount_at_single_tx_limit() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 10_000, 100).unwrap();

    assert!(h.engine.record_debit(&h.executor, &alice, &usdc, 100).is_ok());
    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, 101)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsSingleTxLimit);
}

#[test]
fn tiers_short_circuit_in_order() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    // No record at all.
    assert_eq!(
        h.engine.check_only(&alice, &usdc, 1, NOW).unwrap_err().kind(),
        ErrorKind::NotActive
    );

    h.store.activate(&alice, 1_000, 100).unwrap();
    h.store.deactivate(&alice).unwrap();
    assert_eq!(
        h.engine.check_only(&alice, &usdc, 1, NOW).unwrap_err().kind(),
        ErrorKind::NotActive
    );

    h.store.activate(&alice, 1_000, 100).unwrap();
    h.store.set_emergency(&alice, true).unwrap();
    // Emergency outranks the limit tiers even for an over-limit amount.
    assert_eq!(
        h.engine.check_only(&alice, &usdc, 5_000, NOW).unwrap_err().kind(),
        ErrorKind::EmergencyActive
    );
}

#[test]
fn resource_sublimit_is_the_tighter_bound() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");
    let weth = ResourceId::from("weth");

    h.store.activate(&alice, 10_000, 1_000).unwrap();
    h.store.set_limit(&alice, &usdc, 500).unwrap();

    // Over the sub-limit but well within the daily aggregate.
    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, 600)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsResourceLimit);

    // Unconstrained resource only sees the principal tiers.
    assert!(h.engine.record_debit(&h.executor, &alice, &weth, 600).is_ok());

    // Within both bounds: both counters advance together.
    h.engine.record_debit(&h.executor, &alice, &usdc, 500).unwrap();
    assert_eq!(
        h.store.remaining_for(&alice, &usdc, NOW),
        Remaining::Bounded(0)
    );
    assert_eq!(h.store.remaining(&alice, NOW), 10_000 - 600 - 500);

    // Exhausted sub-limit blocks usdc but not weth.
    assert_eq!(
        h.engine
            .record_debit(&h.executor, &alice, &usdc, 1)
            .unwrap_err()
            .kind(),
        ErrorKind::ExceedsResourceLimit
    );
    assert!(h.engine.record_debit(&h.executor, &alice, &weth, 100).is_ok());
}

#[test]
fn rejected_debit_leaves_sublimit_untouched() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 1_000, 1_000).unwrap();
    h.store.set_limit(&alice, &usdc, 800).unwrap();
    h.engine.record_debit(&h.executor, &alice, &usdc, 700).unwrap();

    let policy_before = h.store.policy(&alice).unwrap();
    let sub_before = h.store.sub_limit(&alice, &usdc).unwrap();

    // Passes principal tiers (300 remaining) but not the sub-limit (100).
    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, 200)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsResourceLimit);

    assert_eq!(h.store.policy(&alice).unwrap(), policy_before);
    assert_eq!(h.store.sub_limit(&alice, &usdc).unwrap(), sub_before);
}

#[test]
fn lowered_limits_bind_future_debits_only() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");

    h.store.activate(&alice, 10_000, 10_000).unwrap();
    h.engine.record_debit(&h.executor, &alice, &usdc, 6_000).unwrap();

    // Lower the ceiling below what is already spent.
    h.store.update_limits(&alice, 5_000, 5_000).unwrap();
    assert_eq!(h.store.policy(&alice).unwrap().spent_today, 6_000);
    assert_eq!(h.store.remaining(&alice, NOW), 0);

    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsDailyLimit);

    // Next period the new, lower ceiling governs.
    h.clock.advance(limen::PERIOD_SECS);
    let later = h.clock.now_unix();
    assert_eq!(h.store.remaining(&alice, later), 5_000);
    assert!(h.engine.record_debit(&h.executor, &alice, &usdc, 5_000).is_ok());
}

#[test]
fn revoked_executor_loses_access_immediately() {
    let clock = Arc::new(ManualClock::new(NOW));
    let store = Arc::new(LedgerStore::new(clock));
    let registry = Arc::new(ExecutorRegistry::new());
    let executor = ExecutorId::from("subscription-biller");
    registry.register(executor.clone());
    let engine = AdmissionEngine::new(store.clone(), registry.clone());

    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");
    store.activate(&alice, 1_000, 100).unwrap();

    assert!(engine.record_debit(&executor, &alice, &usdc, 50).is_ok());
    registry.revoke(&executor);
    assert_eq!(
        engine
            .record_debit(&executor, &alice, &usdc, 50)
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
}

#[test]
fn huge_amounts_never_panic() {
    let h = harness();
    let alice = PrincipalId::from("alice");
    let usdc = ResourceId::from("usdc");
    h.store.activate(&alice, 1_000, 100).unwrap();

    let err = h
        .engine
        .record_debit(&h.executor, &alice, &usdc, Amount::MAX)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExceedsSingleTxLimit);
}
