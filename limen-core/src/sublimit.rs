//! Per-resource sub-limits.
//!
//! A principal may overlay its global daily limit with tighter ceilings on
//! individual resources (one asset, one spending category). Absence of a
//! record means "no sub-limit configured" and the resource tier of the
//! admission check is skipped entirely; the effective allowance for a debit
//! is then `min(principal remaining, resource remaining)` only when a
//! record exists.

use serde::{Deserialize, Serialize};

use crate::clock::period_start;
use crate::Amount;

/// Identifier of a sub-scoped spending category (e.g. one token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remaining allowance for a `(principal, resource)` pair.
///
/// `Unbounded` is the sentinel for "no sub-limit record"; only the
/// principal-level limits apply in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// No sub-limit configured for this resource.
    Unbounded,
    /// At most this much may still be debited this period.
    Bounded(Amount),
}

impl Remaining {
    /// Whether a debit of `amount` fits within this allowance.
    pub fn allows(self, amount: Amount) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(remaining) => amount <= remaining,
        }
    }

    /// The bounded value, if any.
    pub fn bounded(self) -> Option<Amount> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(remaining) => Some(remaining),
        }
    }
}

/// Per-resource daily limit with the same rollover semantics as the
/// principal-level policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLimit {
    /// Maximum aggregate debit of this resource per enforcement period.
    pub daily_limit: Amount,
    /// Total debited within the period starting at `last_reset`.
    pub spent_today: Amount,
    /// Start of the enforcement period as of the last observed rollover.
    pub last_reset: u64,
}

impl SubLimit {
    /// Create a fresh sub-limit with zero spend.
    pub fn new(daily_limit: Amount, now_unix: u64) -> Self {
        Self {
            daily_limit,
            spent_today: 0,
            last_reset: period_start(now_unix),
        }
    }

    /// Spend counted against the period containing `as_of`.
    pub fn effective_spent(&self, as_of: u64) -> Amount {
        if self.last_reset < period_start(as_of) {
            0
        } else {
            self.spent_today
        }
    }

    /// Remaining resource allowance as of `as_of`.
    pub fn remaining(&self, as_of: u64) -> Amount {
        self.daily_limit.saturating_sub(self.effective_spent(as_of))
    }

    /// Apply a committed debit: roll the period over if due, then
    /// accumulate.
    pub fn record(&mut self, amount: Amount, as_of: u64) {
        self.spent_today = self.effective_spent(as_of) + amount;
        self.last_reset = period_start(as_of);
    }
}
