//! Small in-process caches.
//!
//! `TtlCache` keeps expensive per-user aggregates (the dashboard summary)
//! for a short time. `Debouncer` drops repeated identical submissions, such
//! as a double-clicked "add set" button.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Entries kept by a `Debouncer` before stale keys are swept.
const DEBOUNCE_SWEEP_THRESHOLD: usize = 1024;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct TtlCache<K, V> {
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        self.lock().insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value or compute, store and return a fresh one.
    ///
    /// Errors from `load` are passed through and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = load().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone)]
pub struct Debouncer {
    last_seen: Arc<Mutex<HashMap<String, Instant>>>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            last_seen: Arc::new(Mutex::new(HashMap::new())),
            window,
        }
    }

    /// True when `key` has not been seen within the window.
    pub fn should_run(&self, key: &str) -> bool {
        self.should_run_at(key, Instant::now())
    }

    pub fn should_run_at(&self, key: &str, now: Instant) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let mut last_seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());

        if last_seen.len() >= DEBOUNCE_SWEEP_THRESHOLD {
            let window = self.window;
            last_seen.retain(|_, seen| now.saturating_duration_since(*seen) < window);
        }

        match last_seen.get(key) {
            Some(seen) if now.saturating_duration_since(*seen) < self.window => false,
            _ => {
                last_seen.insert(key.to_string(), now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = TtlCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.insert_at("user1".to_string(), 5, now);

        assert_eq!(cache.get_at(&"user1".to_string(), now), Some(5));
        assert_eq!(
            cache.get_at(&"user1".to_string(), now + Duration::from_secs(29)),
            Some(5)
        );
    }

    #[test]
    fn test_expired_value_is_never_returned() {
        let cache = TtlCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.insert_at("user1".to_string(), 5, now);

        assert_eq!(
            cache.get_at(&"user1".to_string(), now + Duration::from_secs(30)),
            None
        );
        // The expired entry is dropped on read.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = TtlCache::new(Duration::from_secs(30));
        cache.insert("a".to_string(), 1);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn test_purge_expired_counts_removed() {
        let cache = TtlCache::new(Duration::from_secs(10));
        let now = Instant::now();
        cache.insert_at("old".to_string(), 1, now);
        cache.insert_at("new".to_string(), 2, now + Duration::from_secs(8));

        let removed = cache.purge_expired_at(now + Duration::from_secs(12));

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("a".to_string(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_loads_once() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(30));
        let mut calls = 0;

        let first: Result<i32, String> = cache
            .get_or_try_insert_with("k".to_string(), || {
                calls += 1;
                async { Ok(7) }
            })
            .await;
        assert_eq!(first, Ok(7));

        let second: Result<i32, String> = cache
            .get_or_try_insert_with("k".to_string(), || async { Ok(99) })
            .await;
        assert_eq!(second, Ok(7));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_does_not_cache_errors() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(30));

        let failed: Result<i32, String> = cache
            .get_or_try_insert_with("k".to_string(), || async { Err("boom".to_string()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_debouncer_suppresses_within_window() {
        let debouncer = Debouncer::new(Duration::from_millis(1500));
        let now = Instant::now();

        assert!(debouncer.should_run_at("set:1", now));
        assert!(!debouncer.should_run_at("set:1", now + Duration::from_millis(500)));
        assert!(debouncer.should_run_at("set:2", now + Duration::from_millis(500)));
        assert!(debouncer.should_run_at("set:1", now + Duration::from_millis(1600)));
    }

    #[test]
    fn test_debouncer_zero_window_always_runs() {
        let debouncer = Debouncer::new(Duration::ZERO);
        assert!(debouncer.should_run("k"));
        assert!(debouncer.should_run("k"));
    }
}
