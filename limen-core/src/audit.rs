//! Audit-fact emission for downstream observers.
//!
//! The indexing/read-model layer mirrors admission state for dashboards by
//! consuming the facts emitted here. Sinks are purely observational: the
//! admission decision never depends on them, and they are invoked outside
//! the per-principal critical section so a slow sink cannot extend lock
//! hold times.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use uuid::Uuid;

use crate::Amount;

/// The required prefix for audit record IDs.
pub const AUDIT_ID_PREFIX: &str = "lmn_evt_";

/// One fact about a state transition in the authorization core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A debit was admitted and committed.
    DebitRecorded {
        principal: String,
        resource: String,
        amount: Amount,
        /// Aggregate spend for the period after this debit.
        spent_today: Amount,
        /// Unix time the debit was recorded at.
        recorded_at: u64,
    },
    /// Protection was activated for a principal.
    Activated {
        principal: String,
        daily_limit: Amount,
        single_tx_limit: Amount,
    },
    /// Limits were updated without resetting the running spend.
    LimitsUpdated {
        principal: String,
        daily_limit: Amount,
        single_tx_limit: Amount,
    },
    /// Protection was deactivated (history preserved).
    Deactivated { principal: String },
    /// The emergency kill-switch was toggled.
    EmergencyToggled { principal: String, enabled: bool },
    /// A resource sub-limit was set or overwritten.
    SubLimitSet {
        principal: String,
        resource: String,
        daily_limit: Amount,
    },
    /// A resource sub-limit was cleared.
    SubLimitCleared { principal: String, resource: String },
    /// An executor identity was registered by governance.
    ExecutorRegistered { executor: String },
    /// An executor identity was revoked by governance.
    ExecutorRevoked { executor: String },
}

/// An [`AuditEvent`] stamped with a time-ordered ID and wall-clock
/// timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Time-ordered record ID (`lmn_evt_` + UUIDv7).
    pub id: String,
    /// ISO 8601 timestamp of emission.
    pub timestamp: String,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    fn stamp(event: AuditEvent) -> Self {
        Self {
            id: format!("{}{}", AUDIT_ID_PREFIX, Uuid::now_v7().simple()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            event,
        }
    }
}

/// Trait for audit sinks.
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Consume one audit record.
    fn publish(&self, record: AuditRecord);
}

/// A sink that writes records to stdout as JSON lines.
///
/// Suitable for containerized deployments where logs are scraped by an
/// external agent.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for StdoutSink {
    fn publish(&self, record: AuditRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to serialize audit record: {err}"),
        }
    }
}

/// A sink that discards everything (auditing disabled).
#[derive(Debug, Default)]
pub struct NoOpSink;

impl AuditSink for NoOpSink {
    fn publish(&self, _record: AuditRecord) {}
}

/// A sink that buffers records in memory, for tests and read-model
/// prototyping.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Drop all buffered records.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

impl AuditSink for MemorySink {
    fn publish(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }
}

/// Global audit sink.
///
/// A single process-wide sink avoids threading the observer through every
/// store and engine call. Defaults to no sink (events dropped) until
/// [`set_global_sink`] is called.
static GLOBAL_SINK: RwLock<Option<Arc<dyn AuditSink>>> = RwLock::new(None);

/// Install the global audit sink.
pub fn set_global_sink(sink: Arc<dyn AuditSink>) {
    if let Ok(mut lock) = GLOBAL_SINK.write() {
        *lock = Some(sink);
    }
}

/// Stamp and publish an event through the global sink, if one is set.
pub fn emit(event: AuditEvent) {
    if let Ok(lock) = GLOBAL_SINK.read() {
        if let Some(sink) = lock.as_ref() {
            sink.publish(AuditRecord::stamp(event));
        }
    }
}
