//! Bounded LRU cache with validity-checked reads.
//!
//! The cache is deliberately small in surface: `get`/`put`/`remove`/`clear`
//! with least-recently-used eviction at a fixed capacity. What makes it more
//! than a plain map is the read-side validity hook: callers can hand
//! [`LruCache::get_valid`] a predicate and a stale entry is then treated as
//! absent and evicted on the spot. This lets resolvers backed by mutable
//! resources (a filesystem, say) invalidate selectively without a global
//! clear.
//!
//! A capacity of `0` disables storage entirely: every `get` misses and
//! every `put` is a no-op, so disabling the cache needs no special-casing
//! in callers.
//!
//! Values are handed out by clone; the caller decides whether that clone is
//! shallow (`Arc`) or a deep copy. Thread safety is a single interior
//! mutex — `get` mutates recency bookkeeping, so a read-write split buys
//! nothing here.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Mutex;

/// A thread-safe, bounded, least-recently-used cache.
pub struct LruCache<K, V> {
    name: String,
    capacity: usize,
    state: Mutex<CacheState<K, V>>,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    // Monotonic access counter; entries stamped on insert and on read.
    tick: u64,
}

struct CacheEntry<V> {
    value: V,
    last_use: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries. Capacity `0`
    /// disables caching.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        LruCache {
            name: name.into(),
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    /// Looks up an entry, refreshing its recency on hit.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_valid(key, |_, _| true)
    }

    /// Looks up an entry, treating it as absent (and evicting it) when the
    /// supplied checker reports it no longer valid.
    pub fn get_valid(&self, key: &K, is_still_valid: impl Fn(&K, &V) -> bool) -> Option<V> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.tick += 1;
        let tick = state.tick;

        let hit = match state.entries.get_mut(key) {
            None => {
                log::trace!("[{}] cache miss for {:?}", self.name, key);
                return None;
            }
            Some(entry) if is_still_valid(key, &entry.value) => {
                entry.last_use = tick;
                Some(entry.value.clone())
            }
            // Present but no longer valid.
            Some(_) => None,
        };

        match hit {
            Some(value) => {
                log::trace!("[{}] cache hit for {:?}", self.name, key);
                Some(value)
            }
            None => {
                log::debug!("[{}] evicting no-longer-valid entry {:?}", self.name, key);
                state.entries.remove(key);
                None
            }
        }
    }

    /// Stores an entry, evicting the least recently used one if the cache
    /// is full. A no-op when the capacity is `0`.
    pub fn put(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                last_use: tick,
            },
        );

        if state.entries.len() > self.capacity {
            let eldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_use)
                .map(|(key, _)| key.clone());
            if let Some(eldest) = eldest {
                log::trace!("[{}] capacity reached, evicting {:?}", self.name, eldest);
                state.entries.remove(&eldest);
            }
        }
    }

    /// Removes a single entry.
    pub fn remove(&self, key: &K) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.remove(key);
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_and_put() {
        let cache = LruCache::new("test", 4);
        assert_eq!(cache.get(&"a"), None);
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction_respects_recency() {
        let cache = LruCache::new("test", 2);
        cache.put("a", 1);
        cache.put("b", 2);
        // Touching "a" makes "b" the eldest.
        assert_eq!(cache.get(&"a"), Some(1));
        cache.put("c", 3);

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = LruCache::new("test", 0);
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_entry_is_evicted_on_read() {
        let cache = LruCache::new("test", 4);
        cache.put("a", 1);

        assert_eq!(cache.get_valid(&"a", |_, _| false), None);
        // Gone for good, not just filtered.
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = LruCache::new("test", 4);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.remove(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(LruCache::new("test", 64));
        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("k{}", (t * 100 + i) % 32);
                    cache.put(key.clone(), i);
                    cache.get(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
