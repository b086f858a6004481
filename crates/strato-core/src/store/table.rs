// ── Generic concurrent row table ──
//
// Lock-free storage with O(1) point lookups and cheap full-table
// snapshots. Row-level mutations are atomic; overlapping writers
// resolve last-write-wins, which is exactly the race semantics the
// reconciliation passes rely on.

use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

/// A concurrent table for a single entity type keyed by its typed id.
///
/// Uses `DashMap` for point lookups and an `ArcSwap` snapshot rebuilt
/// on mutation, so scans never hold shard locks.
pub(crate) struct Table<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    rows: DashMap<K, Arc<T>>,
    snapshot: ArcSwap<Vec<Arc<T>>>,
}

impl<K, T> Table<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            rows: DashMap::new(),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Insert or overwrite a row. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: K, row: T) -> bool {
        let previous = self.rows.insert(key, Arc::new(row));
        self.rebuild_snapshot();
        previous.is_none()
    }

    /// Remove a row by key, returning it if it existed.
    pub(crate) fn remove(&self, key: &K) -> Option<Arc<T>> {
        let removed = self.rows.remove(key).map(|(_, row)| row);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    /// Point lookup by key.
    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.rows.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current full-table snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.load_full()
    }

    /// Rows matching a predicate.
    pub(crate) fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<Arc<T>> {
        self.snapshot()
            .iter()
            .filter(|row| pred(row))
            .map(Arc::clone)
            .collect()
    }

    /// First row matching a predicate.
    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.snapshot().iter().find(|row| pred(row)).map(Arc::clone)
    }

    /// Keys of rows matching a predicate (for cascade passes).
    pub(crate) fn keys_where(&self, pred: impl Fn(&K, &T) -> bool) -> Vec<K> {
        self.rows
            .iter()
            .filter(|entry| pred(entry.key(), entry.value()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    fn rebuild_snapshot(&self) {
        let rows: Vec<Arc<T>> = self.rows.iter().map(|r| Arc::clone(r.value())).collect();
        self.snapshot.store(Arc::new(rows));
    }
}
