//! Weighted, priority-ordered replica pool for one role.
//!
//! # Design Decisions
//! - Selection order is computed once at construction and never mutated;
//!   liveness changes only exclude candidates at selection time
//! - Equal weights keep declaration order (stable sort)
//! - `set_live` is the persistence hook for an external health collaborator;
//!   the retry engine itself only excludes per acquisition call

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::topology::endpoint::{ReplicaEndpoint, Role};

/// A pool slot: the immutable endpoint plus its mutable liveness flag.
pub struct PoolEntry<P> {
    endpoint: Arc<ReplicaEndpoint<P>>,
    live: AtomicBool,
}

impl<P> PoolEntry<P> {
    fn new(endpoint: Arc<ReplicaEndpoint<P>>) -> Self {
        Self {
            endpoint,
            live: AtomicBool::new(true),
        }
    }

    pub fn endpoint(&self) -> &Arc<ReplicaEndpoint<P>> {
        &self.endpoint
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Relaxed);
    }
}

/// Ordered, weighted collection of endpoints for one role.
///
/// Built fresh on every topology change. Holds only the endpoints with a
/// positive weight for its role, in declaration order.
pub struct ReplicaPool<P> {
    role: Role,
    entries: Vec<PoolEntry<P>>,
    /// Indices into `entries`, by descending weight then declaration order.
    selection_order: Vec<usize>,
}

impl<P> ReplicaPool<P> {
    pub(crate) fn new(role: Role, endpoints: &[Arc<ReplicaEndpoint<P>>]) -> Self {
        let entries: Vec<PoolEntry<P>> = endpoints
            .iter()
            .filter(|e| e.supports(role))
            .map(|e| PoolEntry::new(e.clone()))
            .collect();

        let mut selection_order: Vec<usize> = (0..entries.len()).collect();
        // Stable sort: ties between equal weights keep declaration order.
        selection_order.sort_by(|&a, &b| {
            entries[b]
                .endpoint
                .weight(role)
                .cmp(&entries[a].endpoint.weight(role))
        });

        Self {
            role,
            entries,
            selection_order,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Best live candidate not in `excluding`, or `None` when the pool is
    /// empty or every candidate is excluded or dead.
    pub fn select(&self, excluding: &HashSet<String>) -> Option<&PoolEntry<P>> {
        self.selection_order
            .iter()
            .map(|&i| &self.entries[i])
            .find(|entry| entry.is_live() && !excluding.contains(entry.endpoint.key()))
    }

    /// Highest-priority entry regardless of liveness or exclusion.
    pub fn preferred(&self) -> Option<&PoolEntry<P>> {
        self.selection_order.first().map(|&i| &self.entries[i])
    }

    /// Flip the persistent liveness flag for `key`. Returns false when the
    /// pool has no such endpoint.
    pub fn set_live(&self, key: &str, live: bool) -> bool {
        match self.entries.iter().find(|e| e.endpoint.key() == key) {
            Some(entry) => {
                entry.set_live(live);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &PoolEntry<P>> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::endpoint::EngineKind;

    struct NoopProvider;

    fn endpoint(key: &str, read: u32, write: u32) -> Arc<ReplicaEndpoint<NoopProvider>> {
        Arc::new(ReplicaEndpoint::new(
            key,
            read,
            write,
            EngineKind::MySql,
            Arc::new(NoopProvider),
        ))
    }

    fn select_key<'a>(pool: &'a ReplicaPool<NoopProvider>, excluding: &HashSet<String>) -> Option<&'a str> {
        pool.select(excluding).map(|e| e.endpoint().key())
    }

    #[test]
    fn test_select_by_descending_weight() {
        let eps = [endpoint("low", 5, 0), endpoint("high", 10, 0), endpoint("mid", 7, 0)];
        let pool = ReplicaPool::new(Role::Read, &eps);

        let mut excluding = HashSet::new();
        assert_eq!(select_key(&pool, &excluding), Some("high"));
        excluding.insert("high".to_string());
        assert_eq!(select_key(&pool, &excluding), Some("mid"));
        excluding.insert("mid".to_string());
        assert_eq!(select_key(&pool, &excluding), Some("low"));
        excluding.insert("low".to_string());
        assert_eq!(select_key(&pool, &excluding), None);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let eps = [endpoint("a", 10, 0), endpoint("b", 10, 0), endpoint("c", 10, 0)];
        let pool = ReplicaPool::new(Role::Read, &eps);

        let mut excluding = HashSet::new();
        assert_eq!(select_key(&pool, &excluding), Some("a"));
        excluding.insert("a".to_string());
        assert_eq!(select_key(&pool, &excluding), Some("b"));
        excluding.insert("b".to_string());
        assert_eq!(select_key(&pool, &excluding), Some("c"));
    }

    #[test]
    fn test_zero_weight_endpoints_are_not_pooled() {
        let eps = [endpoint("rw", 10, 10), endpoint("read_only", 5, 0)];
        let pool = ReplicaPool::new(Role::Write, &eps);
        assert_eq!(pool.len(), 1);
        assert_eq!(select_key(&pool, &HashSet::new()), Some("rw"));
    }

    #[test]
    fn test_dead_entries_are_skipped_without_reordering() {
        let eps = [endpoint("a", 10, 0), endpoint("b", 5, 0)];
        let pool = ReplicaPool::new(Role::Read, &eps);

        assert!(pool.set_live("a", false));
        assert_eq!(select_key(&pool, &HashSet::new()), Some("b"));

        // Recovery restores the original priority, not a new order.
        assert!(pool.set_live("a", true));
        assert_eq!(select_key(&pool, &HashSet::new()), Some("a"));
    }

    #[test]
    fn test_single_endpoint_always_selected_unless_excluded() {
        let eps = [endpoint("only", 1, 1)];
        let pool = ReplicaPool::new(Role::Read, &eps);

        assert_eq!(select_key(&pool, &HashSet::new()), Some("only"));
        let mut excluding = HashSet::new();
        excluding.insert("only".to_string());
        assert_eq!(select_key(&pool, &excluding), None);
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let pool = ReplicaPool::<NoopProvider>::new(Role::Write, &[]);
        assert!(pool.is_empty());
        assert!(pool.select(&HashSet::new()).is_none());
        assert!(pool.preferred().is_none());
    }

    #[test]
    fn test_set_live_unknown_key() {
        let eps = [endpoint("a", 1, 1)];
        let pool = ReplicaPool::new(Role::Read, &eps);
        assert!(!pool.set_live("missing", false));
    }
}
