//! Error types for Limen.
//!
//! Every admission rejection carries both a machine-readable kind (for
//! executors and dashboards branching on "why was this cycle skipped") and
//! a human-readable display string. All failures in this crate are local,
//! recoverable, and side-effect-free: a rejected call leaves no state
//! change behind, so callers may safely retry on their next scheduled
//! cycle.

use thiserror::Error;

use crate::Amount;

/// Result type alias for Limen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error kinds.
///
/// Protocol-facing representations (dashboard strings, log fields) are
/// derived from these rather than from `Display` output, which may carry
/// request-specific values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Principal has no policy or protection is switched off.
    NotActive,
    /// Activation attempted while a policy is already active.
    AlreadyActive,
    /// Emergency kill-switch is engaged.
    EmergencyActive,
    /// Debit exceeds the per-call ceiling.
    ExceedsSingleTxLimit,
    /// Debit exceeds the remaining daily aggregate.
    ExceedsDailyLimit,
    /// Debit exceeds the remaining per-resource allowance.
    ExceedsResourceLimit,
    /// Configuration parameters violate the limit invariants.
    InvalidLimit,
    /// Caller is not a registered executor.
    Unauthorized,
    /// No record for the referenced principal or resource.
    NotFound,
    /// Emergency toggle would not change the flag.
    EmergencyUnchanged,
    /// A pluggable admission check vetoed the debit.
    CheckRejected,
}

impl ErrorKind {
    /// Machine-readable name (kebab-case).
    pub fn name(self) -> &'static str {
        match self {
            Self::NotActive => "not-active",
            Self::AlreadyActive => "already-active",
            Self::EmergencyActive => "emergency-active",
            Self::ExceedsSingleTxLimit => "exceeds-single-tx-limit",
            Self::ExceedsDailyLimit => "exceeds-daily-limit",
            Self::ExceedsResourceLimit => "exceeds-resource-limit",
            Self::InvalidLimit => "invalid-limit",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not-found",
            Self::EmergencyUnchanged => "emergency-unchanged",
            Self::CheckRejected => "check-rejected",
        }
    }

    /// Human-readable description, independent of any specific request.
    pub fn description(self) -> &'static str {
        match self {
            Self::NotActive => "Protection is not active for this principal",
            Self::AlreadyActive => "Protection is already active for this principal",
            Self::EmergencyActive => "Emergency mode is engaged; all debits rejected",
            Self::ExceedsSingleTxLimit => "Debit exceeds the single-transaction limit",
            Self::ExceedsDailyLimit => "Debit exceeds the remaining daily allowance",
            Self::ExceedsResourceLimit => "Debit exceeds the remaining resource allowance",
            Self::InvalidLimit => "Limit configuration is invalid",
            Self::Unauthorized => "Caller is not a registered executor",
            Self::NotFound => "No record exists for this principal or resource",
            Self::EmergencyUnchanged => "Emergency flag already has the requested value",
            Self::CheckRejected => "An admission check rejected the debit",
        }
    }
}

/// Errors that can occur in Limen operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Principal has no policy, or protection has been deactivated.
    #[error("protection not active for principal '{principal}'")]
    NotActive { principal: String },

    /// Activation attempted while the principal's policy is already active.
    #[error("protection already active for principal '{principal}'")]
    AlreadyActive { principal: String },

    /// Emergency kill-switch is engaged; every debit is rejected until the
    /// principal explicitly clears it.
    #[error("emergency mode engaged for principal '{principal}'")]
    EmergencyActive { principal: String },

    /// Debit exceeds the per-call ceiling.
    #[error("debit {requested} exceeds single-transaction limit {limit}")]
    ExceedsSingleTxLimit { requested: Amount, limit: Amount },

    /// Debit exceeds what remains of the daily aggregate this period.
    #[error("debit {requested} exceeds remaining daily allowance {remaining}")]
    ExceedsDailyLimit { requested: Amount, remaining: Amount },

    /// Debit exceeds what remains of the resource sub-limit this period.
    #[error("debit {requested} exceeds remaining allowance {remaining} for resource '{resource}'")]
    ExceedsResourceLimit {
        resource: String,
        requested: Amount,
        remaining: Amount,
    },

    /// Configuration parameters violate `0 < single_tx_limit <= daily_limit`
    /// or the protocol floor.
    #[error("invalid limit configuration: {0}")]
    InvalidLimit(String),

    /// Caller is not a registered executor.
    #[error("unauthorized executor '{caller}'")]
    Unauthorized { caller: String },

    /// Operation referenced a principal or resource with no record.
    #[error("no record found: {0}")]
    NotFound(String),

    /// Emergency toggle requested the value the flag already holds.
    ///
    /// Explicit error rather than a silent no-op so a double-fired toggle
    /// surfaces instead of masking a client-side bug.
    #[error("emergency flag for principal '{principal}' is already set to {enabled}")]
    EmergencyUnchanged { principal: String, enabled: bool },

    /// A pluggable admission check vetoed the debit.
    #[error("admission check '{check}' rejected debit: {reason}")]
    CheckRejected { check: String, reason: String },
}

impl Error {
    /// Map this error to its machine-readable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotActive { .. } => ErrorKind::NotActive,
            Self::AlreadyActive { .. } => ErrorKind::AlreadyActive,
            Self::EmergencyActive { .. } => ErrorKind::EmergencyActive,
            Self::ExceedsSingleTxLimit { .. } => ErrorKind::ExceedsSingleTxLimit,
            Self::ExceedsDailyLimit { .. } => ErrorKind::ExceedsDailyLimit,
            Self::ExceedsResourceLimit { .. } => ErrorKind::ExceedsResourceLimit,
            Self::InvalidLimit(_) => ErrorKind::InvalidLimit,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EmergencyUnchanged { .. } => ErrorKind::EmergencyUnchanged,
            Self::CheckRejected { .. } => ErrorKind::CheckRejected,
        }
    }

    /// Machine-readable name (kebab-case) of this error's kind.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}
