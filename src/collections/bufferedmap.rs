//! Associative container that tolerates structural mutation during traversal.
//!
//! [`BufferedMap`] lets a visitor passed to [`BufferedMap::for_each`] add,
//! remove or clear entries of the very map it is walking. While any traversal
//! is active those operations are recorded in a pending buffer and are
//! invisible to the traversal; once the outermost traversal returns, the
//! buffer is flushed in one go:
//!
//! 1. a pending clear empties the stored entries,
//! 2. pending additions are inserted in the order they were issued,
//! 3. pending removals are applied.
//!
//! A clear issued mid-traversal discards whatever was buffered before it, so
//! only additions issued *after* the clear survive the flush.
//!
//! Queries such as [`BufferedMap::contains_key`] and [`BufferedMap::len`]
//! answer for the *effective* view (stored entries plus pending edits), which
//! keeps keys unique across the whole pre- and post-flush history.
//!
//! Traversals nest: a visitor may start another traversal of the same map.
//! Depth is counted and buffers are only flushed when it drops back to zero.
//!
//! The update services use this container to prune dead and expired entries
//! while dispatching ticks to the live ones.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{SchedulerError, SchedulerResult};

/// Edits recorded while a traversal is in progress.
struct Pending<K, V> {
    adds: SmallVec<[(K, V); 4]>,
    removes: SmallVec<[K; 4]>,
    clear: bool,
}

impl<K, V> Default for Pending<K, V> {
    fn default() -> Self {
        Self {
            adds: SmallVec::new(),
            removes: SmallVec::new(),
            clear: false,
        }
    }
}

impl<K, V> Pending<K, V> {
    fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty() && !self.clear
    }
}

/// Restores the traversal depth even if a visitor unwinds.
struct TraversalGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> TraversalGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        TraversalGuard { depth }
    }
}

impl Drop for TraversalGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// A hash map whose add/remove/clear calls are deferred while it is being iterated.
///
/// All methods take `&self`; the map uses interior mutability so that a
/// visitor holding a shared reference can still request edits.
pub struct BufferedMap<K, V> {
    items: RefCell<FxHashMap<K, V>>,
    pending: RefCell<Pending<K, V>>,
    depth: Cell<usize>,
}

impl<K, V> Default for BufferedMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BufferedMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        BufferedMap {
            items: RefCell::new(FxHashMap::default()),
            pending: RefCell::new(Pending::default()),
            depth: Cell::new(0),
        }
    }

    /// Returns `true` while at least one traversal is running.
    pub fn is_iterating(&self) -> bool {
        self.depth.get() > 0
    }

    /// Returns `true` if a clear has been requested and not yet flushed.
    pub fn is_clear_pending(&self) -> bool {
        self.pending.borrow().clear
    }

    /// Whether `key` is present in the effective view.
    pub fn contains_key(&self, key: &K) -> bool {
        let pending = self.pending.borrow();
        if pending.adds.iter().any(|(k, _)| k == key) {
            return true;
        }
        if pending.clear || pending.removes.contains(key) {
            return false;
        }
        self.items.borrow().contains_key(key)
    }

    /// Number of entries in the effective view.
    pub fn len(&self) -> usize {
        let pending = self.pending.borrow();
        let items = self.items.borrow();
        let base = if pending.clear {
            0
        } else {
            items.len() - pending.removes.len()
        };
        // A pending add over a live stored key is a replacement, not a new entry.
        let fresh = pending
            .adds
            .iter()
            .filter(|(k, _)| pending.clear || !items.contains_key(k))
            .count();
        base + fresh
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a new entry.
    ///
    /// Fails with [`SchedulerError::DuplicateKey`] if the key is already part
    /// of the effective view. During a traversal the entry is buffered.
    pub fn add(&self, key: K, value: V) -> SchedulerResult<()> {
        if self.contains_key(&key) {
            return Err(SchedulerError::DuplicateKey(format!("{key:?}")));
        }
        if self.is_iterating() {
            let mut pending = self.pending.borrow_mut();
            pending.removes.retain(|k| k != &key);
            pending.adds.push((key, value));
        } else {
            self.items.borrow_mut().insert(key, value);
        }
        Ok(())
    }

    /// Adds or replaces an entry. Never fails.
    pub fn insert(&self, key: K, value: V) {
        if self.is_iterating() {
            // The flush inserts over any stored value, so a queued removal
            // of the same key would drop the replacement.
            let mut pending = self.pending.borrow_mut();
            pending.adds.retain(|(k, _)| k != &key);
            pending.removes.retain(|k| k != &key);
            pending.adds.push((key, value));
        } else {
            self.items.borrow_mut().insert(key, value);
        }
    }

    /// Removes an entry, returning whether it existed in the effective view.
    pub fn remove(&self, key: &K) -> bool {
        if !self.contains_key(key) {
            return false;
        }
        if self.is_iterating() {
            let mut pending = self.pending.borrow_mut();
            pending.adds.retain(|(k, _)| k != key);
            let stored = !pending.clear && self.items.borrow().contains_key(key);
            if stored && !pending.removes.contains(key) {
                pending.removes.push(key.clone());
            }
        } else {
            self.items.borrow_mut().remove(key);
        }
        true
    }

    /// Empties the map, or marks it for clearing if a traversal is active.
    pub fn clear(&self) {
        if self.is_iterating() {
            let mut pending = self.pending.borrow_mut();
            pending.adds.clear();
            pending.removes.clear();
            pending.clear = true;
        } else {
            self.items.borrow_mut().clear();
        }
    }

    /// Calls `visitor` once per stored entry in the map's natural order.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V),
    {
        self.traverse(|items| {
            for (k, v) in items.iter() {
                visitor(k, v);
            }
        });
    }

    /// Calls `visitor` once per stored key.
    pub fn for_each_key<F>(&self, mut visitor: F)
    where
        F: FnMut(&K),
    {
        self.traverse(|items| {
            for k in items.keys() {
                visitor(k);
            }
        });
    }

    /// Calls `visitor` once per stored value.
    pub fn for_each_value<F>(&self, mut visitor: F)
    where
        F: FnMut(&V),
    {
        self.traverse(|items| {
            for v in items.values() {
                visitor(v);
            }
        });
    }

    /// Applies buffered edits. Does nothing while a traversal is running.
    pub fn flush_buffers(&self) {
        if self.is_iterating() {
            return;
        }
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() {
            return;
        }
        let mut items = self.items.borrow_mut();
        if pending.clear {
            items.clear();
        }
        for (k, v) in pending.adds {
            items.insert(k, v);
        }
        for k in pending.removes.iter() {
            items.remove(k);
        }
    }

    fn traverse<F>(&self, visit: F)
    where
        F: FnOnce(&FxHashMap<K, V>),
    {
        {
            let _guard = TraversalGuard::enter(&self.depth);
            let items = self.items.borrow();
            visit(&items);
        }
        self.flush_buffers();
    }
}

impl<K, V> BufferedMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Returns a clone of the value stored for `key` in the effective view.
    pub fn get(&self, key: &K) -> Option<V> {
        let pending = self.pending.borrow();
        if let Some((_, v)) = pending.adds.iter().rev().find(|(k, _)| k == key) {
            return Some(v.clone());
        }
        if pending.clear || pending.removes.contains(key) {
            return None;
        }
        self.items.borrow().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> BufferedMap<String, String> {
        let map = BufferedMap::new();
        for k in ["a", "b", "c"] {
            map.add(k.to_string(), k.to_string()).unwrap();
        }
        map
    }

    // ==================== DIRECT MUTATION TESTS ====================

    #[test]
    fn test_add_outside_traversal_applies_immediately() {
        let map = abc();
        assert_eq!(map.len(), 3);
        assert!(map.contains_key(&"b".to_string()));
    }

    #[test]
    fn test_add_duplicate_fails() {
        let map = abc();
        let err = map.add("a".to_string(), "again".to_string()).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateKey(_)));
        assert_eq!(map.get(&"a".to_string()).as_deref(), Some("a"));
    }

    #[test]
    fn test_remove_reports_presence() {
        let map = abc();
        assert!(map.remove(&"a".to_string()));
        assert!(!map.remove(&"a".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_insert_replaces() {
        let map = abc();
        map.insert("a".to_string(), "z".to_string());
        assert_eq!(map.get(&"a".to_string()).as_deref(), Some("z"));
        assert_eq!(map.len(), 3);
    }

    // ==================== BUFFERED MUTATION TESTS ====================

    #[test]
    fn test_buffered_add_during_iteration() {
        let map = abc();
        let mut visited = 0;
        map.for_each(|k, _| {
            visited += 1;
            map.add(format!("{k}1"), format!("{k}1")).unwrap();
        });
        // New entries were not visited by the traversal that created them.
        assert_eq!(visited, 3);
        assert_eq!(map.len(), 6);
        assert!(map.contains_key(&"c1".to_string()));
    }

    #[test]
    fn test_buffered_remove_during_iteration() {
        let map = abc();
        let mut visited = 0;
        map.for_each_key(|k| {
            visited += 1;
            assert!(map.remove(k));
        });
        assert_eq!(visited, 3);
        assert!(map.is_empty());
    }

    #[test]
    fn test_edits_invisible_until_flush() {
        let map = abc();
        map.for_each_key(|k| {
            if k == "a" {
                map.remove(&"b".to_string());
            }
        });
        // "b" may or may not have been visited before "a"; either way it is gone now.
        assert!(!map.contains_key(&"b".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_effective_view_during_iteration() {
        let map = abc();
        map.for_each_key(|k| {
            if k == "a" {
                map.add("d".to_string(), "d".to_string()).unwrap();
                assert!(map.contains_key(&"d".to_string()));
                assert!(matches!(
                    map.add("d".to_string(), "d".to_string()),
                    Err(SchedulerError::DuplicateKey(_))
                ));
                assert!(map.remove(&"c".to_string()));
                assert!(!map.contains_key(&"c".to_string()));
                assert_eq!(map.len(), 3);
            }
        });
        assert_eq!(map.len(), 3);
        assert!(map.contains_key(&"d".to_string()));
        assert!(!map.contains_key(&"c".to_string()));
    }

    #[test]
    fn test_remove_then_readd_during_iteration() {
        let map = abc();
        map.for_each_key(|k| {
            if k == "a" {
                assert!(map.remove(&"b".to_string()));
                map.add("b".to_string(), "b2".to_string()).unwrap();
            }
        });
        assert_eq!(map.get(&"b".to_string()).as_deref(), Some("b2"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_insert_during_iteration_replaces() {
        let map = abc();
        map.for_each_key(|k| {
            if k == "a" {
                map.insert("a".to_string(), "a2".to_string());
                assert_eq!(map.len(), 3);
            }
        });
        assert_eq!(map.get(&"a".to_string()).as_deref(), Some("a2"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_clear_during_iteration_overrides_earlier_adds() {
        let map = abc();
        let mut first = true;
        map.for_each_key(|_| {
            if first {
                first = false;
                map.add("x".to_string(), "x".to_string()).unwrap();
                map.clear();
                assert!(map.is_clear_pending());
                map.add("y".to_string(), "y".to_string()).unwrap();
            }
        });
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&"y".to_string()));
        assert!(!map.contains_key(&"x".to_string()));
        assert!(!map.is_clear_pending());
    }

    #[test]
    fn test_count_matches_issued_operations() {
        let map: BufferedMap<u32, u32> = BufferedMap::new();
        for i in 0..10 {
            map.add(i, i).unwrap();
        }
        let mut adds = 0;
        let mut removes = 0;
        map.for_each(|k, _| {
            if k % 2 == 0 {
                if map.remove(k) {
                    removes += 1;
                }
            } else if map.add(k + 100, 0).is_ok() {
                adds += 1;
            }
        });
        assert_eq!(map.len(), 10 + adds - removes);
    }

    // ==================== RE-ENTRANCY TESTS ====================

    #[test]
    fn test_nested_traversal_defers_flush_to_outermost() {
        let map = abc();
        map.for_each_key(|outer| {
            if outer == "a" {
                map.for_each_key(|_| {});
                map.add("inner".to_string(), "inner".to_string()).unwrap();
                map.for_each_key(|inner| {
                    assert_ne!(inner, "inner");
                });
                assert!(map.is_iterating());
            }
        });
        assert!(!map.is_iterating());
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_flush_is_noop_while_iterating() {
        let map = abc();
        map.for_each_value(|_| {
            map.add("late".to_string(), "late".to_string()).ok();
            map.flush_buffers();
        });
        assert_eq!(map.len(), 4);
    }
}
