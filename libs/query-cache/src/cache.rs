use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use common_errors::AppError;
use moka::{
    future::Cache,
    ops::compute::{CompResult, Op},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

use crate::{config::CacheConfig, key::QueryKey};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::unknown(&format!("Cache error: {err}"))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bytes: Bytes,
    updated_at: Instant,
    invalidated: bool,
}

/// Observable state of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Invalidated,
}

/// Generation log consulted by fetches that were in flight while keys
/// changed underneath them.
#[derive(Debug, Default)]
struct Generations {
    current: u64,
    /// Prefix -> generation of its latest invalidation, removal or
    /// authoritative write.
    marks: HashMap<QueryKey, u64>,
    cleared_at: u64,
}

impl Generations {
    fn bump(&mut self, prefix: &QueryKey, in_flight: usize) {
        if in_flight == 0 {
            self.marks.clear();
        }
        self.current += 1;
        self.marks.insert(prefix.clone(), self.current);
    }

    fn touched_since(&self, key: &QueryKey, since: u64) -> bool {
        self.cleared_at > since
            || self
                .marks
                .iter()
                .any(|(prefix, at)| *at > since && key.starts_with(prefix))
    }
}

/// Taken before loading a value from the backing store and handed back to
/// [`QueryCache::write_fetched`].
#[derive(Debug)]
pub struct FetchTicket {
    generation: u64,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchTicket {
    fn drop(&mut self) { self.in_flight.fetch_sub(1, Ordering::AcqRel); }
}

/// Query result cache addressed by [`QueryKey`].
///
/// Values are stored as JSON so one cache can hold every payload type.
/// Clones share the same storage.
///
/// A fetch that started before an invalidation, removal or authoritative
/// write of its key never lands afterwards: [`write_fetched`] drops the
/// result instead of resurrecting pre-mutation data.
///
/// [`write_fetched`]: QueryCache::write_fetched
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<QueryKey, CacheEntry>,
    generations: Arc<RwLock<Generations>>,
    in_flight: Arc<AtomicUsize>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(capacity) = config.capacity {
            builder = builder.max_capacity(capacity);
        }
        Self {
            cache: builder.build(),
            generations: Arc::default(),
            in_flight: Arc::default(),
        }
    }

    pub fn unbounded() -> Self { Self::new(&CacheConfig::unbounded()) }

    /// Returns the cached value unless it is absent or invalidated.
    pub async fn read<T: DeserializeOwned>(
        &self, key: &QueryKey,
    ) -> CacheResult<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) if !entry.invalidated => decode(&entry.bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Like [`read`](Self::read) but also treats entries older than
    /// `stale_time` as missing.
    pub async fn read_fresh<T: DeserializeOwned>(
        &self, key: &QueryKey, stale_time: Duration,
    ) -> CacheResult<Option<T>> {
        match self.cache.get(key).await {
            Some(entry)
                if !entry.invalidated
                    && entry.updated_at.elapsed() < stale_time =>
            {
                decode(&entry.bytes).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Reads a value regardless of invalidation.
    pub async fn read_stale<T: DeserializeOwned>(
        &self, key: &QueryKey,
    ) -> CacheResult<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => decode(&entry.bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn state(&self, key: &QueryKey) -> Option<EntryState> {
        self.cache.get(key).await.map(|entry| {
            if entry.invalidated {
                EntryState::Invalidated
            }
            else {
                EntryState::Fresh
            }
        })
    }

    /// Authoritative write, e.g. the saved resource returned by a
    /// mutation. Supersedes any fetch of `key` still in flight.
    pub async fn write<T: Serialize + ?Sized>(
        &self, key: QueryKey, value: &T,
    ) -> CacheResult<()> {
        let bytes = encode(value)?;
        let mut generations = self.generations.write().await;
        generations.bump(&key, self.in_flight.load(Ordering::Acquire));
        debug!("Cache write {}", key);
        self.insert(key, bytes).await;
        Ok(())
    }

    /// Starts a fetch. Hold the ticket until the result is written back.
    pub async fn ticket(&self) -> FetchTicket {
        let generations = self.generations.read().await;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        FetchTicket {
            generation: generations.current,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Stores a fetched value unless `key` was invalidated, removed or
    /// overwritten after `ticket` was taken. Returns whether it was stored.
    pub async fn write_fetched<T: Serialize + ?Sized>(
        &self, key: QueryKey, value: &T, ticket: FetchTicket,
    ) -> CacheResult<bool> {
        let bytes = encode(value)?;
        let generations = self.generations.read().await;
        if generations.touched_since(&key, ticket.generation) {
            debug!("Dropping fetch of {} overtaken by a mutation", key);
            return Ok(false);
        }
        debug!("Cache write {}", key);
        self.insert(key, bytes).await;
        Ok(true)
    }

    /// Marks every entry under `prefix` as needing a refresh. Returns the
    /// number of entries newly marked.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut generations = self.generations.write().await;
        generations.bump(prefix, self.in_flight.load(Ordering::Acquire));

        let matching: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(key, entry)| !entry.invalidated && key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        let mut marked = 0;
        for key in matching {
            let result = self
                .cache
                .entry(key)
                .and_compute_with(|current| {
                    let op = match current.map(|entry| entry.into_value()) {
                        Some(entry) if !entry.invalidated => {
                            Op::Put(CacheEntry {
                                invalidated: true,
                                ..entry
                            })
                        }
                        _ => Op::Nop,
                    };
                    std::future::ready(op)
                })
                .await;
            if matches!(result, CompResult::ReplacedWith(_)) {
                marked += 1;
            }
        }
        debug!("Invalidated {} entries under {}", marked, prefix);
        marked
    }

    /// Deletes a single exact entry.
    pub async fn remove(&self, key: &QueryKey) -> bool {
        let mut generations = self.generations.write().await;
        generations.bump(key, self.in_flight.load(Ordering::Acquire));
        let existed = self.cache.remove(key).await.is_some();
        debug!("Cache remove {} (existed: {})", key, existed);
        existed
    }

    /// Deletes every entry under `prefix`.
    pub async fn remove_prefix(&self, prefix: &QueryKey) -> usize {
        let mut generations = self.generations.write().await;
        generations.bump(prefix, self.in_flight.load(Ordering::Acquire));
        let matching: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in &matching {
            self.cache.invalidate(key).await;
        }
        matching.len()
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> =
            self.cache.iter().map(|(key, _)| (*key).clone()).collect();
        keys.sort();
        keys
    }

    /// Drops every entry; fetches in flight are discarded as well.
    pub async fn clear(&self) {
        let mut generations = self.generations.write().await;
        generations.current += 1;
        generations.cleared_at = generations.current;
        generations.marks.clear();
        self.cache.invalidate_all();
    }

    async fn insert(&self, key: QueryKey, bytes: Bytes) {
        self.cache
            .insert(
                key,
                CacheEntry {
                    bytes,
                    updated_at: Instant::now(),
                    invalidated: false,
                },
            )
            .await;
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &Bytes) -> CacheResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| CacheError::Deserialization(e.to_string()))
}
