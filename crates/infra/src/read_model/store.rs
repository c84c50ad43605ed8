use std::collections::BTreeMap;
use std::sync::RwLock;

/// Key/value store abstraction for directory records.
pub trait Store<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V);
    /// All values in key order.
    fn list(&self) -> Vec<V>;

    /// Values picked by `pick`, in key order, without cloning the rest.
    fn select<T, F>(&self, pick: F) -> Vec<T>
    where
        F: FnMut(&V) -> Option<T>;

    fn count_where<F>(&self, pred: F) -> usize
    where
        F: FnMut(&V) -> bool;
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<BTreeMap<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for InMemoryStore<K, V>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<K, V> Store<K, V> for InMemoryStore<K, V>
where
    K: Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key, value);
        }
    }

    fn list(&self) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.values().cloned().collect()
    }

    fn select<T, F>(&self, pick: F) -> Vec<T>
    where
        F: FnMut(&V) -> Option<T>,
    {
        match self.inner.read() {
            Ok(map) => map.values().filter_map(pick).collect(),
            Err(_) => vec![],
        }
    }

    fn count_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&V) -> bool,
    {
        match self.inner.read() {
            Ok(map) => map.values().filter(|v| pred(*v)).count(),
            Err(_) => 0,
        }
    }
}
