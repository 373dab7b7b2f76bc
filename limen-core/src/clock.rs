//! Enforcement-period clock utilities.
//!
//! Daily limits accumulate over fixed-length, epoch-aligned windows rather
//! than calendar days in any local timezone. [`period_start`] is the single
//! source of truth for bucketing a timestamp into its window; both the
//! read-only remaining-allowance views and the mutating debit path use it,
//! so the two can never drift.

use std::sync::atomic::{AtomicU64, Ordering};

/// Length of one enforcement period in seconds (24 hours).
pub const PERIOD_SECS: u64 = 86_400;

/// Truncate a unix timestamp down to the start of its enforcement period.
///
/// Pure and total: every timestamp maps to exactly one period start, and
/// timestamps within the same period map to the same value.
pub fn period_start(unix_secs: u64) -> u64 {
    unix_secs - unix_secs % PERIOD_SECS
}

/// Source of "now" for the stores and the admission engine.
///
/// Abstracted so rollover behavior is testable without sleeping across a
/// real period boundary.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current unix time in seconds.
    fn now_unix(&self) -> u64;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        // Pre-1970 system clocks clamp to 0 rather than panicking.
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually-driven clock for tests.
///
/// Thread-safe so concurrency tests can share one instance across workers.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at the given unix time.
    pub fn new(now_unix: u64) -> Self {
        Self {
            now: AtomicU64::new(now_unix),
        }
    }

    /// Jump to an absolute unix time.
    pub fn set(&self, now_unix: u64) {
        self.now.store(now_unix, Ordering::SeqCst);
    }

    /// Advance the clock by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
