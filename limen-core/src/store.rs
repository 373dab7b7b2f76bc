//! Durable keyed store for principal configuration and resource sub-limits.
//!
//! One [`AccountRecord`] per principal holds the spend policy together with
//! that principal's resource sub-limits, behind a single per-principal
//! `RwLock`. That lock is the linearization point for everything the
//! admission engine does to one principal: readers (`check_only`, the
//! remaining-allowance views) share it, a committing debit takes it
//! exclusively, and unrelated principals never contend.
//!
//! All principal-facing mutations (activation, limit updates, emergency
//! toggles, sub-limit configuration) validate first and write only after
//! every check has passed, so an error never leaves partial state behind.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::audit::{self, AuditEvent};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::policy::{validate_limits, PrincipalId, SpendPolicy};
use crate::sublimit::{Remaining, ResourceId, SubLimit};
use crate::Amount;

/// Everything the core tracks for one principal.
#[derive(Debug, Clone)]
pub(crate) struct AccountRecord {
    pub(crate) policy: SpendPolicy,
    pub(crate) sub_limits: HashMap<ResourceId, SubLimit>,
}

/// Keyed store of per-principal records.
///
/// The outer map lock is held only long enough to find or insert an entry;
/// all state inspection and mutation happens under the entry's own lock.
#[derive(Debug)]
pub struct LedgerStore {
    accounts: RwLock<HashMap<PrincipalId, Arc<RwLock<AccountRecord>>>>,
    clock: Arc<dyn Clock>,
}

impl LedgerStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// The clock this store (and the engine built on it) observes.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn entry(&self, principal: &PrincipalId) -> Option<Arc<RwLock<AccountRecord>>> {
        self.accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(principal)
            .cloned()
    }

    fn read_entry<'a>(
        entry: &'a Arc<RwLock<AccountRecord>>,
    ) -> RwLockReadGuard<'a, AccountRecord> {
        entry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entry<'a>(
        entry: &'a Arc<RwLock<AccountRecord>>,
    ) -> RwLockWriteGuard<'a, AccountRecord> {
        entry.write().unwrap_or_else(|e| e.into_inner())
    }

    // ========================================================================
    // Principal configuration
    // ========================================================================

    /// Enable protection for a principal.
    ///
    /// Fails with `AlreadyActive` if protection is currently enabled, and
    /// with `InvalidLimit` on bad parameters. On success the policy starts
    /// fresh: zero spend, reset marker at the current period start. A
    /// reactivation after `deactivate` therefore cannot bank unused
    /// allowance accrued before the dormant stretch; configured sub-limit
    /// ceilings survive but their running spend is reset the same way.
    pub fn activate(
        &self,
        principal: &PrincipalId,
        daily_limit: Amount,
        single_tx_limit: Amount,
    ) -> Result<()> {
        validate_limits(daily_limit, single_tx_limit)?;
        let now = self.clock.now_unix();

        let existing = {
            let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
            match accounts.get(principal) {
                Some(entry) => Some(entry.clone()),
                None => {
                    accounts.insert(
                        principal.clone(),
                        Arc::new(RwLock::new(AccountRecord {
                            policy: SpendPolicy::new(daily_limit, single_tx_limit, now),
                            sub_limits: HashMap::new(),
                        })),
                    );
                    None
                }
            }
        };

        if let Some(entry) = existing {
            let mut record = Self::write_entry(&entry);
            if record.policy.is_active {
                return Err(Error::AlreadyActive {
                    principal: principal.to_string(),
                });
            }
            // Reactivation: fresh counters, configured sub-limit ceilings
            // survive with their spend reset.
            record.policy = SpendPolicy::new(daily_limit, single_tx_limit, now);
            for sub in record.sub_limits.values_mut() {
                *sub = SubLimit::new(sub.daily_limit, now);
            }
        }

        tracing::debug!(principal = %principal, daily_limit, single_tx_limit, "protection activated");
        audit::emit(AuditEvent::Activated {
            principal: principal.to_string(),
            daily_limit,
            single_tx_limit,
        });
        Ok(())
    }

    /// Replace the principal's limits without resetting the running spend.
    ///
    /// A lowered ceiling may transiently sit below `spent_today`;
    /// subsequent debits are checked against the new ceiling (and reject),
    /// but no retroactive penalty is applied.
    pub fn update_limits(
        &self,
        principal: &PrincipalId,
        daily_limit: Amount,
        single_tx_limit: Amount,
    ) -> Result<()> {
        validate_limits(daily_limit, single_tx_limit)?;
        let entry = self.require(principal)?;
        {
            let mut record = Self::write_entry(&entry);
            if !record.policy.is_active {
                return Err(Error::NotActive {
                    principal: principal.to_string(),
                });
            }
            record.policy.daily_limit = daily_limit;
            record.policy.single_tx_limit = single_tx_limit;
        }

        audit::emit(AuditEvent::LimitsUpdated {
            principal: principal.to_string(),
            daily_limit,
            single_tx_limit,
        });
        Ok(())
    }

    /// Switch protection off, preserving limits and spend history.
    pub fn deactivate(&self, principal: &PrincipalId) -> Result<()> {
        let entry = self.require(principal)?;
        {
            let mut record = Self::write_entry(&entry);
            if !record.policy.is_active {
                return Err(Error::NotActive {
                    principal: principal.to_string(),
                });
            }
            record.policy.is_active = false;
        }

        tracing::debug!(principal = %principal, "protection deactivated");
        audit::emit(AuditEvent::Deactivated {
            principal: principal.to_string(),
        });
        Ok(())
    }

    /// Toggle the emergency kill-switch.
    ///
    /// Requesting the value the flag already holds is an explicit
    /// `EmergencyUnchanged` error so a double-fired toggle surfaces.
    pub fn set_emergency(&self, principal: &PrincipalId, enabled: bool) -> Result<()> {
        let entry = self.require(principal)?;
        {
            let mut record = Self::write_entry(&entry);
            if !record.policy.is_active {
                return Err(Error::NotActive {
                    principal: principal.to_string(),
                });
            }
            if record.policy.emergency == enabled {
                return Err(Error::EmergencyUnchanged {
                    principal: principal.to_string(),
                    enabled,
                });
            }
            record.policy.emergency = enabled;
        }

        tracing::warn!(principal = %principal, enabled, "emergency flag toggled");
        audit::emit(AuditEvent::EmergencyToggled {
            principal: principal.to_string(),
            enabled,
        });
        Ok(())
    }

    /// Remaining daily allowance as of `as_of`. Zero when the principal has
    /// no record or protection is off. Rollover-aware, never mutates.
    pub fn remaining(&self, principal: &PrincipalId, as_of: u64) -> Amount {
        match self.entry(principal) {
            Some(entry) => Self::read_entry(&entry).policy.remaining(as_of),
            None => 0,
        }
    }

    /// Snapshot of the principal's policy, if any. Intended for views and
    /// tests verifying that rejected calls left no state change.
    pub fn policy(&self, principal: &PrincipalId) -> Option<SpendPolicy> {
        self.entry(principal)
            .map(|entry| Self::read_entry(&entry).policy.clone())
    }

    // ========================================================================
    // Resource sub-limits
    // ========================================================================

    /// Configure (or overwrite) a resource sub-limit with fresh spend state.
    ///
    /// A `daily_limit` of zero means "no sub-limit" and clears any existing
    /// record, matching the absence semantics of the admission check.
    pub fn set_limit(
        &self,
        principal: &PrincipalId,
        resource: &ResourceId,
        daily_limit: Amount,
    ) -> Result<()> {
        if daily_limit == 0 {
            return self.clear_limit(principal, resource);
        }
        let entry = self.require(principal)?;
        let now = self.clock.now_unix();
        {
            let mut record = Self::write_entry(&entry);
            record
                .sub_limits
                .insert(resource.clone(), SubLimit::new(daily_limit, now));
        }

        audit::emit(AuditEvent::SubLimitSet {
            principal: principal.to_string(),
            resource: resource.to_string(),
            daily_limit,
        });
        Ok(())
    }

    /// Remove a resource sub-limit. Idempotent once the principal exists.
    pub fn clear_limit(&self, principal: &PrincipalId, resource: &ResourceId) -> Result<()> {
        let entry = self.require(principal)?;
        let removed = {
            let mut record = Self::write_entry(&entry);
            record.sub_limits.remove(resource).is_some()
        };

        if removed {
            audit::emit(AuditEvent::SubLimitCleared {
                principal: principal.to_string(),
                resource: resource.to_string(),
            });
        }
        Ok(())
    }

    /// Remaining resource allowance as of `as_of`; `Unbounded` when no
    /// sub-limit record exists.
    pub fn remaining_for(
        &self,
        principal: &PrincipalId,
        resource: &ResourceId,
        as_of: u64,
    ) -> Remaining {
        match self.entry(principal) {
            Some(entry) => match Self::read_entry(&entry).sub_limits.get(resource) {
                Some(sub) => Remaining::Bounded(sub.remaining(as_of)),
                None => Remaining::Unbounded,
            },
            None => Remaining::Unbounded,
        }
    }

    /// Snapshot of a resource sub-limit, if configured.
    pub fn sub_limit(&self, principal: &PrincipalId, resource: &ResourceId) -> Option<SubLimit> {
        self.entry(principal)
            .and_then(|entry| Self::read_entry(&entry).sub_limits.get(resource).cloned())
    }

    fn require(&self, principal: &PrincipalId) -> Result<Arc<RwLock<AccountRecord>>> {
        self.entry(principal).ok_or_else(|| {
            Error::NotFound(format!("no policy record for principal '{principal}'"))
        })
    }
}
