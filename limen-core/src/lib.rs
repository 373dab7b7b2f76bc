//! # Limen Core
//!
//! Spending-authorization and limit-enforcement core for intent-based
//! asset-protection automation.
//!
//! Principals grant bounded, revocable spending authority to automated
//! strategies (recurring swaps, rebalancing, stop-loss protection,
//! subscription billing). Limen sits between those strategies and the
//! funds: every proposed debit passes through the [`AdmissionEngine`],
//! which enforces a per-call ceiling, a rolling daily aggregate, and an
//! optional per-resource sub-ceiling before the strategy is allowed to
//! move anything.
//!
//! ## Key Concepts
//!
//! - **Principal**: the account whose spending is protected.
//! - **Policy**: the principal's limits plus running spend state,
//!   auto-resetting at fixed enforcement-period boundaries.
//! - **Executor**: a registered strategy identity; only executors may
//!   commit debits.
//! - **Admission**: the two-phase check/commit flow — `check_only` is a
//!   pure pre-flight, `record_debit` is the atomic commit.
//!
//! ## Example
//!
//! ```rust,ignore
//! use limen::{AdmissionEngine, ExecutorRegistry, LedgerStore, SystemClock};
//! use std::sync::Arc;
//!
//! let store = Arc::new(LedgerStore::new(Arc::new(SystemClock)));
//! let registry = Arc::new(ExecutorRegistry::new());
//! registry.register("dca-executor".into());
//!
//! store.activate(&"alice".into(), 1_000_000, 50_000)?;
//!
//! let engine = AdmissionEngine::new(store, registry);
//! engine.record_debit(&"dca-executor".into(), &"alice".into(), &"usdc".into(), 25_000)?;
//! ```

pub mod audit;
pub mod clock;
pub mod engine;
pub mod error;
pub mod filter;
pub mod policy;
pub mod registry;
pub mod store;
pub mod sublimit;

pub use audit::{AuditEvent, AuditRecord, AuditSink, MemorySink, NoOpSink, StdoutSink};
pub use clock::{period_start, Clock, ManualClock, SystemClock, PERIOD_SECS};
pub use engine::{AdmissionEngine, DebitCheck, DebitReceipt, DebitRequest};
pub use error::{Error, ErrorKind, Result};
pub use filter::{CounterpartyId, TargetFilter};
pub use policy::{PrincipalId, SpendPolicy};
pub use registry::{ExecutorId, ExecutorRegistry};
pub use store::LedgerStore;
pub use sublimit::{Remaining, ResourceId, SubLimit};

/// Unsigned amount type for limits and debits.
///
/// Wide enough for base-unit token amounts (wei-scale) without overflow
/// concerns in the admission arithmetic.
pub type Amount = u128;

/// Protocol floor for a principal's daily limit, in base units.
///
/// Activation and limit updates reject daily limits below this value so a
/// principal cannot configure a policy too small to admit any meaningful
/// strategy execution.
pub const MIN_DAILY_LIMIT: Amount = 1_000;
