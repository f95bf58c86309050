use std::collections::HashMap;
use std::hash::Hash;

pub struct AssetCache<K, V> {
    cache: HashMap<K, V>,
}

impl<K, V> Default for AssetCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AssetCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        AssetCache {
            cache: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.cache.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.cache.get_mut(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.cache.insert(key, value);
    }

    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> V) -> &mut V {
        self.cache.entry(key).or_insert_with(build)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.cache.remove(key)
    }

    /// Drops every entry `keep` rejects, returning how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) -> usize {
        let before = self.cache.len();
        self.cache.retain(|k, v| keep(k, v));
        before - self.cache.len()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_once_per_key() {
        let mut cache = AssetCache::new();
        let mut builds = 0;
        for _ in 0..3 {
            cache.get_or_insert_with("earth", || {
                builds += 1;
                42
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.get(&"earth"), Some(&42));
    }

    #[test]
    fn retain_reports_evictions() {
        let mut cache = AssetCache::new();
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(cache.retain(|k, _| *k != 2), 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&2).is_none());
    }
}
