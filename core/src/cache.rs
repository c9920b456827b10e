//! Tag-based cache invalidation.
//!
//! Reads are bound to one or more [`CacheTag`]s. Each tag carries a
//! monotonically increasing version held by [`TagVersions`]; invalidating a
//! tag bumps the version and broadcasts the tag. A [`TaggedCache`] entry
//! remembers the versions it was loaded under and is only served while all
//! of them are current, so any read bound to a tag observes every write
//! committed before that tag was invalidated.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::types::EventId;

/// Capacity of the invalidation broadcast channel.
const BROADCAST_CAPACITY: usize = 256;

/// A unit of invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Every listing of events
    Events,
    /// Reads of one event
    Event(EventId),
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Events => f.write_str("events"),
            Self::Event(id) => write!(f, "event-{id}"),
        }
    }
}

/// Current version of every tag, plus the invalidation broadcast.
#[derive(Debug)]
pub struct TagVersions {
    versions: RwLock<HashMap<CacheTag, u64>>,
    sender: broadcast::Sender<CacheTag>,
}

impl TagVersions {
    /// Every tag starts at version 0.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            versions: RwLock::new(HashMap::new()),
            sender,
        }
    }

    /// Invalidate a tag. Returns its new version.
    pub fn invalidate(&self, tag: CacheTag) -> u64 {
        let version = {
            let mut versions = self
                .versions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let v = versions.entry(tag).or_insert(0);
            *v += 1;
            *v
        };

        metrics::counter!("planner.cache.invalidations").increment(1);
        tracing::debug!(tag = %tag, version, "Cache tag invalidated");

        // No subscribers is fine.
        let _ = self.sender.send(tag);
        version
    }

    /// Forget a tag that no read can be bound to anymore.
    ///
    /// Used once an event is gone. Neither counted nor broadcast: readers
    /// of the event are retired through the [`CacheTag::Events`]
    /// invalidation that accompanies the removal.
    pub fn retire(&self, tag: &CacheTag) {
        self.versions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(tag);
    }

    /// Number of tags that have been invalidated and not retired.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Current version of a tag.
    #[must_use]
    pub fn version(&self, tag: &CacheTag) -> u64 {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .copied()
            .unwrap_or(0)
    }

    /// Sample the versions of several tags at once.
    #[must_use]
    pub fn stamp(&self, tags: &[CacheTag]) -> Vec<u64> {
        let versions = self.versions.read().unwrap_or_else(PoisonError::into_inner);
        tags.iter()
            .map(|tag| versions.get(tag).copied().unwrap_or(0))
            .collect()
    }

    /// Receive every tag invalidated from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheTag> {
        self.sender.subscribe()
    }
}

impl Default for TagVersions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    tags: Vec<CacheTag>,
    stamp: Vec<u64>,
    stored_at: Instant,
    seq: u64,
}

/// Memoizes reads under a key, invalidated through tags.
///
/// The key must identify everything the loaded value depends on besides
/// its tags, the viewer included when the value is filtered per viewer.
#[derive(Debug)]
pub struct TaggedCache<K, V> {
    name: &'static str,
    versions: Arc<TagVersions>,
    ttl: Duration,
    capacity: usize,
    next_seq: AtomicU64,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Hash + Eq + Clone, V: Clone> TaggedCache<K, V> {
    /// Create a cache. A zero `ttl` or `capacity` disables caching.
    #[must_use]
    pub fn new(
        name: &'static str,
        versions: Arc<TagVersions>,
        ttl: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            name,
            versions,
            ttl,
            capacity,
            next_seq: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero() && self.capacity > 0
    }

    /// Serve `key` from the cache, or run `load` and remember its result.
    ///
    /// Tag versions are sampled before `load` starts: a write that commits
    /// and invalidates while the load is in flight leaves the stored entry
    /// already stale.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` fails with; failures are never cached.
    pub async fn get_or_load<F, Fut, E>(
        &self,
        key: K,
        tags: Vec<CacheTag>,
        load: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if !self.enabled() {
            return load().await;
        }

        if let Some(value) = self.get(&key) {
            metrics::counter!("planner.cache.hits", "cache" => self.name).increment(1);
            return Ok(value);
        }
        metrics::counter!("planner.cache.misses", "cache" => self.name).increment(1);

        let stamp = self.versions.stamp(&tags);
        let value = load().await?;
        self.insert(key, tags, stamp, value.clone());
        Ok(value)
    }

    /// A fresh cached value for `key`, if any.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if self.is_fresh(entry) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    fn insert(&self, key: K, tags: Vec<CacheTag>, stamp: Vec<u64>, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            entries.retain(|_, entry| self.is_fresh(entry));
        }
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                tags,
                stamp,
                stored_at: Instant::now(),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        entry.stored_at.elapsed() < self.ttl && self.versions.stamp(&entry.tags) == entry.stamp
    }

    /// Number of entries currently held, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
