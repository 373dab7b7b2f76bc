//! Admission engine.
//!
//! The central contract of the authorization core. Strategy executors call
//! [`AdmissionEngine::check_only`] to pre-flight a debit and
//! [`AdmissionEngine::record_debit`] to commit it. Both paths evaluate the
//! same ordered tiers, short-circuiting on the first failure:
//!
//! 1. Policy exists and is active — else `NotActive`
//! 2. Emergency flag clear — else `EmergencyActive`
//! 3. Amount within the per-call ceiling — else `ExceedsSingleTxLimit`
//! 4. Amount within the remaining daily aggregate (rollover-aware) — else
//!    `ExceedsDailyLimit`
//! 5. Amount within the resource sub-limit, when one exists — else
//!    `ExceedsResourceLimit`
//! 6. Every pluggable [`DebitCheck`], in registration order
//!
//! `record_debit` is the only state-mutating entry point. It gates on the
//! executor registry before reading anything, re-runs the full evaluation
//! under the principal's exclusive lock, and applies rollover-then-
//! accumulate to the policy and the sub-limit as one staged commit. A
//! failure at any tier returns with zero mutation, so executors may treat
//! every rejection as "skip this cycle" and safely retry next cycle.
//!
//! No I/O happens inside the critical section; the audit fact is emitted
//! after the lock is released.

use std::sync::Arc;

use serde::Serialize;

use crate::audit::{self, AuditEvent};
use crate::error::{Error, Result};
use crate::policy::PrincipalId;
use crate::registry::{ExecutorId, ExecutorRegistry};
use crate::store::LedgerStore;
use crate::sublimit::ResourceId;
use crate::Amount;

/// A proposed debit, as seen by pluggable checks.
#[derive(Debug, Clone, Copy)]
pub struct DebitRequest<'a> {
    /// Principal whose allowance would be consumed.
    pub principal: &'a PrincipalId,
    /// Resource being spent.
    pub resource: &'a ResourceId,
    /// Proposed debit amount.
    pub amount: Amount,
    /// Evaluation time (unix seconds).
    pub as_of: u64,
}

/// A pluggable admission check, run after the built-in limit tiers.
///
/// Checks must be side-effect-free: they run inside the per-principal
/// critical section on the debit path and may be re-evaluated on the
/// read-only path. Returning `Err(reason)` vetoes the debit with
/// `CheckRejected`.
pub trait DebitCheck: Send + Sync + std::fmt::Debug {
    /// Stable name surfaced in rejection reasons.
    fn name(&self) -> &'static str;

    /// Veto or admit the proposed debit.
    fn check(&self, request: &DebitRequest<'_>) -> std::result::Result<(), String>;
}

/// Proof of a committed debit, returned to the calling executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebitReceipt {
    pub principal: PrincipalId,
    pub resource: ResourceId,
    pub amount: Amount,
    /// Aggregate spend for the period after this debit.
    pub spent_today: Amount,
    /// Unix time the debit was recorded at.
    pub recorded_at: u64,
}

/// The admission engine: authorization gate plus limit state machine.
#[derive(Debug)]
pub struct AdmissionEngine {
    store: Arc<LedgerStore>,
    registry: Arc<ExecutorRegistry>,
    checks: Vec<Arc<dyn DebitCheck>>,
}

impl AdmissionEngine {
    /// Build an engine over the given store and executor registry.
    pub fn new(store: Arc<LedgerStore>, registry: Arc<ExecutorRegistry>) -> Self {
        Self {
            store,
            registry,
            checks: Vec::new(),
        }
    }

    /// Append a pluggable check, run after the built-in tiers in
    /// registration order.
    pub fn with_check(mut self, check: Arc<dyn DebitCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// The store this engine admits against.
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Read-only simulation of a debit as of `as_of`.
    ///
    /// Never blocks writers for longer than one snapshot read and never
    /// mutates. The returned error carries both the machine-readable kind
    /// and the human-readable reason a dashboard would display.
    pub fn check_only(
        &self,
        principal: &PrincipalId,
        resource: &ResourceId,
        amount: Amount,
        as_of: u64,
    ) -> Result<()> {
        let request = DebitRequest {
            principal,
            resource,
            amount,
            as_of,
        };
        let entry = match self.store.entry(principal) {
            Some(entry) => entry,
            None => {
                return Err(Error::NotActive {
                    principal: principal.to_string(),
                })
            }
        };
        let record = entry.read().unwrap_or_else(|e| e.into_inner());
        self.evaluate(&record, &request)
    }

    /// Admit and atomically commit a debit.
    ///
    /// The caller must be a registered executor; the gate runs before any
    /// principal state is read. All tiers are re-evaluated against the
    /// current clock under the principal's exclusive lock, so concurrent
    /// executions serialize per principal and can never jointly overshoot
    /// the daily ceiling. On success the rollover (if due) and the
    /// accumulation are committed together to the policy and, when
    /// configured, the resource sub-limit.
    pub fn record_debit(
        &self,
        caller: &ExecutorId,
        principal: &PrincipalId,
        resource: &ResourceId,
        amount: Amount,
    ) -> Result<DebitReceipt> {
        if !self.registry.is_authorized(caller) {
            return Err(Error::Unauthorized {
                caller: caller.to_string(),
            });
        }

        let entry = match self.store.entry(principal) {
            Some(entry) => entry,
            None => {
                return Err(Error::NotActive {
                    principal: principal.to_string(),
                })
            }
        };

        let now = self.store.clock().now_unix();
        let request = DebitRequest {
            principal,
            resource,
            amount,
            as_of: now,
        };

        let receipt = {
            let mut record = entry.write().unwrap_or_else(|e| e.into_inner());

            // Validate against current state; nothing below mutates until
            // every tier has passed.
            if let Err(err) = self.evaluate(&record, &request) {
                tracing::debug!(
                    principal = %principal,
                    resource = %resource,
                    amount,
                    reason = err.name(),
                    "debit rejected"
                );
                return Err(err);
            }

            record.policy.record(amount, now);
            if let Some(sub) = record.sub_limits.get_mut(resource) {
                sub.record(amount, now);
            }

            DebitReceipt {
                principal: principal.clone(),
                resource: resource.clone(),
                amount,
                spent_today: record.policy.spent_today,
                recorded_at: now,
            }
        };

        tracing::debug!(
            principal = %principal,
            resource = %resource,
            amount,
            spent_today = receipt.spent_today,
            "debit recorded"
        );
        audit::emit(AuditEvent::DebitRecorded {
            principal: principal.to_string(),
            resource: resource.to_string(),
            amount,
            spent_today: receipt.spent_today,
            recorded_at: now,
        });
        Ok(receipt)
    }

    /// The ordered admission tiers, shared verbatim by both paths.
    fn evaluate(
        &self,
        record: &crate::store::AccountRecord,
        request: &DebitRequest<'_>,
    ) -> Result<()> {
        let policy = &record.policy;

        if !policy.is_active {
            return Err(Error::NotActive {
                principal: request.principal.to_string(),
            });
        }
        if policy.emergency {
            return Err(Error::EmergencyActive {
                principal: request.principal.to_string(),
            });
        }
        if request.amount > policy.single_tx_limit {
            return Err(Error::ExceedsSingleTxLimit {
                requested: request.amount,
                limit: policy.single_tx_limit,
            });
        }
        let remaining = policy.remaining(request.as_of);
        if request.amount > remaining {
            return Err(Error::ExceedsDailyLimit {
                requested: request.amount,
                remaining,
            });
        }
        if let Some(sub) = record.sub_limits.get(request.resource) {
            let sub_remaining = sub.remaining(request.as_of);
            if request.amount > sub_remaining {
                return Err(Error::ExceedsResourceLimit {
                    resource: request.resource.to_string(),
                    requested: request.amount,
                    remaining: sub_remaining,
                });
            }
        }
        for check in &self.checks {
            check
                .check(request)
                .map_err(|reason| Error::CheckRejected {
                    check: check.name().to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}
