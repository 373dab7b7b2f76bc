//! Whitelist/target filter.
//!
//! Optional allow-list of counterparties a principal's automation may
//! interact with. Strategy executors consult this before constructing a
//! transfer; the admission engine deliberately does not, keeping its
//! contract narrow and independently testable.
//!
//! Policy (pinned, single and consistent): an empty set for a principal
//! means all counterparties are allowed (default-open). Once the set is
//! non-empty, only enumerated counterparties are allowed (default-deny).
//! Removing the last entry returns the principal to default-open.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::policy::PrincipalId;

/// Identity of a counterparty an automated transfer would interact with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterpartyId(String);

impl CounterpartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CounterpartyId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CounterpartyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-principal counterparty allow-lists.
#[derive(Debug, Default)]
pub struct TargetFilter {
    entries: RwLock<HashMap<PrincipalId, HashSet<CounterpartyId>>>,
}

impl TargetFilter {
    /// Create an empty filter (every principal default-open).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a counterparty to the principal's allow-list. Idempotent.
    pub fn add(&self, principal: &PrincipalId, counterparty: CounterpartyId) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(principal.clone())
            .or_default()
            .insert(counterparty);
    }

    /// Remove a counterparty from the principal's allow-list. Idempotent.
    ///
    /// Removing the last entry drops the set, returning the principal to
    /// default-open.
    pub fn remove(&self, principal: &PrincipalId, counterparty: &CounterpartyId) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(set) = entries.get_mut(principal) {
            set.remove(counterparty);
            if set.is_empty() {
                entries.remove(principal);
            }
        }
    }

    /// Whether the counterparty is explicitly enumerated for the principal.
    pub fn contains(&self, principal: &PrincipalId, counterparty: &CounterpartyId) -> bool {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .get(principal)
                    .is_some_and(|set| set.contains(counterparty))
            })
            .unwrap_or(false)
    }

    /// The filter decision executors act on: allowed when the principal's
    /// list is empty (default-open) or when the counterparty is enumerated.
    pub fn is_allowed(&self, principal: &PrincipalId, counterparty: &CounterpartyId) -> bool {
        self.entries
            .read()
            .map(|entries| match entries.get(principal) {
                None => true,
                Some(set) => set.contains(counterparty),
            })
            .unwrap_or(false)
    }

    /// Number of enumerated counterparties for a principal.
    pub fn len(&self, principal: &PrincipalId) -> usize {
        self.entries
            .read()
            .map(|entries| entries.get(principal).map_or(0, HashSet::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_default_open() {
        let filter = TargetFilter::new();
        let alice = PrincipalId::from("alice");
        assert!(filter.is_allowed(&alice, &CounterpartyId::from("anyone")));
        assert!(!filter.contains(&alice, &CounterpartyId::from("anyone")));
    }

    #[test]
    fn non_empty_list_is_default_deny() {
        let filter = TargetFilter::new();
        let alice = PrincipalId::from("alice");
        let dex = CounterpartyId::from("dex-router");

        filter.add(&alice, dex.clone());
        assert!(filter.is_allowed(&alice, &dex));
        assert!(!filter.is_allowed(&alice, &CounterpartyId::from("other")));
    }

    #[test]
    fn removing_last_entry_returns_to_default_open() {
        let filter = TargetFilter::new();
        let alice = PrincipalId::from("alice");
        let dex = CounterpartyId::from("dex-router");

        filter.add(&alice, dex.clone());
        filter.remove(&alice, &dex);
        assert_eq!(filter.len(&alice), 0);
        assert!(filter.is_allowed(&alice, &CounterpartyId::from("anyone")));
    }

    #[test]
    fn principals_do_not_share_lists() {
        let filter = TargetFilter::new();
        let alice = PrincipalId::from("alice");
        let bob = PrincipalId::from("bob");

        filter.add(&alice, CounterpartyId::from("dex-router"));
        // Bob never configured a list; still default-open.
        assert!(filter.is_allowed(&bob, &CounterpartyId::from("anywhere")));
        assert!(!filter.is_allowed(&alice, &CounterpartyId::from("anywhere")));
    }
}
