use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Resource lists are kept for roughly one admin session
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Shared in-memory cache with per-entry expiry. Clones share storage.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    storage: Arc<RwLock<HashMap<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            ttl: self.ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn for_session() -> Self {
        Self::new(SESSION_TTL)
    }

    /// Expired entries are dropped on read
    pub fn get(&self, key: &K) -> Option<V> {
        {
            let storage = self.storage.read().ok()?;
            match storage.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        if let Ok(mut storage) = self.storage.write() {
            storage.insert(
                key,
                Entry {
                    value,
                    stored_at: Instant::now(),
                    ttl: self.ttl,
                },
            );
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.storage
            .write()
            .ok()?
            .remove(key)
            .map(|entry| entry.value)
    }

    pub fn clear(&self) {
        if let Ok(mut storage) = self.storage.write() {
            storage.clear();
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.storage
            .read()
            .map(|s| s.get(key).is_some_and(|entry| !entry.is_expired()))
            .unwrap_or(false)
    }
}
