//! Process-local counter cache.

use super::{CacheResult, CounterCache, CounterKey};
use dashmap::DashMap;

/// `DashMap`-backed counter cache shared across request threads.
#[derive(Debug, Default)]
pub struct InMemoryCounterCache {
    counters: DashMap<String, i64>,
}

impl InMemoryCounterCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterCache for InMemoryCounterCache {
    fn get(&self, key: &CounterKey) -> CacheResult<Option<i64>> {
        Ok(self.counters.get(&key.to_string()).map(|entry| *entry))
    }

    fn set(&self, key: &CounterKey, value: i64) -> CacheResult<()> {
        self.counters.insert(key.to_string(), value);
        Ok(())
    }

    fn increment(&self, key: &CounterKey) -> CacheResult<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    fn invalidate(&self, key: &CounterKey) -> CacheResult<()> {
        self.counters.remove(&key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCounterCache;
    use crate::cache::{CounterCache, CounterKey};
    use crate::model::kind::ShareableKind;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn get_reports_miss_until_set() {
        let cache = InMemoryCounterCache::new();
        let key = CounterKey::new("u", ShareableKind::Goal);

        assert_eq!(cache.get(&key).unwrap(), None);
        cache.set(&key, 2).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(2));
    }

    #[test]
    fn increment_starts_missing_keys_at_one() {
        let cache = InMemoryCounterCache::new();
        let key = CounterKey::new("u", ShareableKind::Challenge);

        assert_eq!(cache.increment(&key).unwrap(), 1);
        assert_eq!(cache.increment(&key).unwrap(), 2);
        cache.invalidate(&key).unwrap();
        assert_eq!(cache.get(&key).unwrap(), None);
    }

    #[test]
    fn keys_are_partitioned_by_user_and_kind() {
        let cache = InMemoryCounterCache::new();
        cache
            .set(&CounterKey::new("a", ShareableKind::Goal), 3)
            .unwrap();

        assert_eq!(
            cache.get(&CounterKey::new("a", ShareableKind::Habit)).unwrap(),
            None
        );
        assert_eq!(
            cache.get(&CounterKey::new("b", ShareableKind::Goal)).unwrap(),
            None
        );
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let cache = Arc::new(InMemoryCounterCache::new());
        let key = CounterKey::new("u", ShareableKind::Goal);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        cache.increment(&key).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.get(&key).unwrap(), Some(800));
    }
}
