//! Bounded, time-limited in-memory cache
//!
//! A [`MaybeCache`] is either backed by an [`ExpiringCache`] or disabled. A
//! disabled cache accepts `put` and always misses on `get`, so callers can
//! run with caching turned off without branching.
//!
//! Values are stored as `Arc<V>`. By default `get` hands back the same
//! allocation that was `put`, so mutating through interior mutability is
//! visible to every holder. With copies enabled, values are cloned on the
//! way in and on the way out.

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, trace};

/// Source of the current time in milliseconds since UNIX epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

struct Entry<V> {
    value: Arc<V>,
    expires_at_ms: i64,
}

/// Named cache holding at most `max_size` entries for `ttl` each
///
/// Entries are kept in insertion order; overwriting a key moves it to the
/// back. Once the cache is over capacity the oldest insertions are evicted.
pub struct ExpiringCache<K, V> {
    name: String,
    max_size: usize,
    ttl_ms: i64,
    make_copies: bool,
    clock: Arc<dyn Clock>,
    entries: Mutex<IndexMap<K, Entry<V>>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(name: &str, max_size: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.to_string(),
            max_size,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            make_copies: false,
            clock,
            entries: Mutex::new(IndexMap::with_capacity(max_size)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A panic while holding the lock cannot leave an entry half-written,
    /// so a poisoned map is still usable.
    fn lock_entries(&self) -> MutexGuard<'_, IndexMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn share(&self, value: &Arc<V>) -> Arc<V> {
        if self.make_copies {
            Arc::new(V::clone(value))
        } else {
            Arc::clone(value)
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now_ms();
        let mut entries = self.lock_entries();

        let entry = entries.get(key)?;
        if now < entry.expires_at_ms {
            return Some(self.share(&entry.value));
        }

        trace!("Cache {}: dropping expired entry", self.name);
        entries.shift_remove(key);
        None
    }

    pub fn put(&self, key: K, value: Arc<V>) {
        let entry = Entry {
            value: self.share(&value),
            expires_at_ms: self.clock.now_ms().saturating_add(self.ttl_ms),
        };

        let mut entries = self.lock_entries();
        entries.shift_remove(&key);
        entries.insert(key, entry);

        while entries.len() > self.max_size {
            entries.shift_remove_index(0);
            debug!("Cache {}: evicted oldest entry", self.name);
        }
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache handle that may be switched off
pub struct MaybeCache<K, V> {
    inner: Option<ExpiringCache<K, V>>,
}

impl<K, V> Default for MaybeCache<K, V> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<K, V> MaybeCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Enabled cache using the wall clock
    pub fn new(name: &str, max_size: usize, ttl: Duration) -> Self {
        Self::with_clock(name, max_size, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &str, max_size: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        debug!(
            "Creating cache {} (max {} entries, ttl {:?})",
            name, max_size, ttl
        );
        Self {
            inner: Some(ExpiringCache::new(name, max_size, ttl, clock)),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Clone values on every `put` and `get`
    pub fn with_copies(mut self, make_copies: bool) -> Self {
        if let Some(cache) = self.inner.as_mut() {
            cache.make_copies = make_copies;
        }
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.as_ref()?.get(key)
    }

    pub fn put(&self, key: K, value: Arc<V>) {
        if let Some(cache) = &self.inner {
            cache.put(key, value);
        }
    }
}
