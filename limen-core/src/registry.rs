//! Executor registry.
//!
//! Governance registers the strategy-executor identities allowed to commit
//! debits. Registration is out-of-band relative to the per-execution hot
//! path; the hot path only performs the [`ExecutorRegistry::is_authorized`]
//! lookup, and the admission engine runs that gate before touching any
//! principal state.

use std::collections::HashSet;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::audit::{self, AuditEvent};

/// Identity of an automated strategy executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutorId(String);

impl ExecutorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExecutorId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ExecutorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable set of authorized executor identities.
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    authorized: RwLock<HashSet<ExecutorId>>,
}

impl ExecutorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize an executor identity. Idempotent.
    pub fn register(&self, executor: ExecutorId) {
        let inserted = {
            let mut authorized = self.authorized.write().unwrap_or_else(|e| e.into_inner());
            authorized.insert(executor.clone())
        };
        if inserted {
            tracing::debug!(executor = %executor, "executor registered");
            audit::emit(AuditEvent::ExecutorRegistered {
                executor: executor.to_string(),
            });
        }
    }

    /// Remove an executor identity. Idempotent.
    pub fn revoke(&self, executor: &ExecutorId) {
        let removed = {
            let mut authorized = self.authorized.write().unwrap_or_else(|e| e.into_inner());
            authorized.remove(executor)
        };
        if removed {
            tracing::debug!(executor = %executor, "executor revoked");
            audit::emit(AuditEvent::ExecutorRevoked {
                executor: executor.to_string(),
            });
        }
    }

    /// Pure lookup: whether this identity may commit debits.
    pub fn is_authorized(&self, executor: &ExecutorId) -> bool {
        self.authorized
            .read()
            .map(|set| set.contains(executor))
            .unwrap_or(false)
    }
}
