//! Per-principal spend policy.
//!
//! A [`SpendPolicy`] is the durable configuration record for one protected
//! principal: the daily aggregate ceiling, the per-call ceiling, the running
//! spend for the current enforcement period, and the activation/emergency
//! flags.
//!
//! The key invariant is `0 < single_tx_limit <= daily_limit`, with
//! `daily_limit` at or above the protocol floor. The running spend never
//! exceeds `daily_limit` while the reset marker is current.
//!
//! Rollover is computed here, once, and consumed by both the read-only
//! views and the mutating debit path so the two can never disagree about
//! which period a timestamp falls into.

use serde::{Deserialize, Serialize};

use crate::clock::period_start;
use crate::error::{Error, Result};
use crate::{Amount, MIN_DAILY_LIMIT};

/// Identifier of a protected principal (the account whose spending is
/// limited).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PrincipalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a (daily, single-transaction) limit pair.
///
/// Shared by activation and limit updates so both reject with identical
/// reasons.
pub fn validate_limits(daily_limit: Amount, single_tx_limit: Amount) -> Result<()> {
    if daily_limit < MIN_DAILY_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "daily limit {daily_limit} is below the protocol floor {MIN_DAILY_LIMIT}"
        )));
    }
    if single_tx_limit == 0 {
        return Err(Error::InvalidLimit(
            "single-transaction limit must be greater than zero".into(),
        ));
    }
    if single_tx_limit > daily_limit {
        return Err(Error::InvalidLimit(format!(
            "single-transaction limit {single_tx_limit} exceeds daily limit {daily_limit}"
        )));
    }
    Ok(())
}

/// Durable spend-limit configuration and running state for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendPolicy {
    /// Maximum aggregate debit per enforcement period.
    pub daily_limit: Amount,
    /// Maximum debit per call.
    pub single_tx_limit: Amount,
    /// Total debited within the period starting at `last_reset`.
    pub spent_today: Amount,
    /// Start of the enforcement period as of the last observed rollover.
    pub last_reset: u64,
    /// Whether protection is enabled. All admission checks fail closed
    /// when false.
    pub is_active: bool,
    /// Manual kill-switch. When engaged, every debit is rejected until the
    /// principal explicitly clears it.
    pub emergency: bool,
}

impl SpendPolicy {
    /// Create a freshly-activated policy with zero spend.
    ///
    /// Limits must already be validated via [`validate_limits`].
    pub fn new(daily_limit: Amount, single_tx_limit: Amount, now_unix: u64) -> Self {
        Self {
            daily_limit,
            single_tx_limit,
            spent_today: 0,
            last_reset: period_start(now_unix),
            is_active: true,
            emergency: false,
        }
    }

    /// True if the stored reset marker predates the period containing
    /// `as_of`, i.e. a rollover is due.
    pub fn rollover_due(&self, as_of: u64) -> bool {
        self.last_reset < period_start(as_of)
    }

    /// Spend counted against the period containing `as_of`.
    ///
    /// Zero when the stored state belongs to an earlier period; the stored
    /// `spent_today` otherwise. This is the single rollover computation
    /// shared by `check_only` and `record_debit`.
    pub fn effective_spent(&self, as_of: u64) -> Amount {
        if self.rollover_due(as_of) {
            0
        } else {
            self.spent_today
        }
    }

    /// Remaining daily allowance as of `as_of`, zero when inactive.
    ///
    /// Saturating: a limit lowered below the current spend reads as zero
    /// remaining rather than underflowing.
    pub fn remaining(&self, as_of: u64) -> Amount {
        if !self.is_active {
            return 0;
        }
        self.daily_limit.saturating_sub(self.effective_spent(as_of))
    }

    /// Apply a committed debit: roll the period over if due, then
    /// accumulate.
    ///
    /// Callers must have already admitted `amount` against the limits;
    /// this only performs the state transition.
    pub fn record(&mut self, amount: Amount, as_of: u64) {
        self.spent_today = self.effective_spent(as_of) + amount;
        self.last_reset = period_start(as_of);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PERIOD_SECS;
    use crate::ErrorKind;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn validate_limits_enforces_floor_and_ordering() {
        assert!(validate_limits(MIN_DAILY_LIMIT, 1).is_ok());
        assert_eq!(
            validate_limits(MIN_DAILY_LIMIT - 1, 1).unwrap_err().kind(),
            ErrorKind::InvalidLimit
        );
        assert_eq!(
            validate_limits(MIN_DAILY_LIMIT, 0).unwrap_err().kind(),
            ErrorKind::InvalidLimit
        );
        assert_eq!(
            validate_limits(MIN_DAILY_LIMIT, MIN_DAILY_LIMIT + 1)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidLimit
        );
    }

    #[test]
    fn fresh_policy_starts_at_period_boundary() {
        let policy = SpendPolicy::new(10_000, 1_000, NOW);
        assert_eq!(policy.last_reset, period_start(NOW));
        assert_eq!(policy.spent_today, 0);
        assert!(policy.is_active);
        assert!(!policy.emergency);
    }

    #[test]
    fn effective_spent_rolls_over_across_periods() {
        let mut policy = SpendPolicy::new(10_000, 1_000, NOW);
        policy.record(400, NOW);
        assert_eq!(policy.effective_spent(NOW), 400);
        assert_eq!(policy.remaining(NOW), 9_600);

        // Same period, later call: no reset.
        assert_eq!(policy.effective_spent(NOW + 10), 400);

        // Next period: spend reads as zero without any mutation.
        let next = NOW + PERIOD_SECS;
        assert_eq!(policy.effective_spent(next), 0);
        assert_eq!(policy.remaining(next), 10_000);
        assert_eq!(policy.spent_today, 400, "view must not mutate");
    }

    #[test]
    fn record_applies_rollover_then_accumulates() {
        let mut policy = SpendPolicy::new(10_000, 1_000, NOW);
        policy.record(400, NOW);

        let next = NOW + PERIOD_SECS;
        policy.record(100, next);
        assert_eq!(policy.spent_today, 100);
        assert_eq!(policy.last_reset, period_start(next));

        // Second debit in the new period does not re-reset.
        policy.record(50, next + 1);
        assert_eq!(policy.spent_today, 150);
    }

    #[test]
    fn remaining_is_zero_when_inactive() {
        let mut policy = SpendPolicy::new(10_000, 1_000, NOW);
        policy.is_active = false;
        assert_eq!(policy.remaining(NOW), 0);
    }

    #[test]
    fn remaining_saturates_when_limit_lowered_below_spend() {
        let mut policy = SpendPolicy::new(10_000, 1_000, NOW);
        policy.record(900, NOW);
        policy.daily_limit = 500; // lowered mid-period
        policy.single_tx_limit = 500;
        assert_eq!(policy.remaining(NOW), 0);
    }
}
