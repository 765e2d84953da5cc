use crate::domain::candidate::Candidate;
use crate::resolve::SymbolSearch;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_TTL_SECS: i64 = 3600;
pub const DEFAULT_CAPACITY: usize = 128;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    candidates: Vec<Candidate>,
    inserted_at: DateTime<Utc>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    // Monotonic use counter for LRU ordering.
    tick: u64,
}

/// Memoizes search results per normalized query.
///
/// Constructed once per process and shared; entries expire after the TTL and the
/// least recently used entry is evicted once `capacity` distinct keys are stored.
/// Concurrent misses on the same key may both hit the network; the last write wins.
pub struct CandidateCache {
    search: Arc<dyn SymbolSearch>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    capacity: usize,
    state: tokio::sync::Mutex<CacheState>,
}

impl CandidateCache {
    pub fn new(search: Arc<dyn SymbolSearch>) -> Self {
        Self::with_policy(
            search,
            Arc::new(SystemClock),
            chrono::Duration::seconds(DEFAULT_TTL_SECS),
            DEFAULT_CAPACITY,
        )
    }

    pub fn with_policy(
        search: Arc<dyn SymbolSearch>,
        clock: Arc<dyn Clock>,
        ttl: chrono::Duration,
        capacity: usize,
    ) -> Self {
        Self {
            search,
            clock,
            ttl,
            capacity: capacity.max(1),
            state: tokio::sync::Mutex::new(CacheState::default()),
        }
    }

    pub fn from_env(search: Arc<dyn SymbolSearch>) -> Self {
        let ttl_secs = std::env::var("CANDIDATE_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS);
        let capacity = std::env::var("CANDIDATE_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CAPACITY);
        Self::with_policy(
            search,
            Arc::new(SystemClock),
            chrono::Duration::seconds(ttl_secs),
            capacity,
        )
    }

    /// Cached candidates for `key`, calling the search backend on miss or expiry.
    ///
    /// Empty results are cached too. Backend errors are not cached.
    pub async fn get_or_fetch(&self, key: &str) -> anyhow::Result<Vec<Candidate>> {
        if let Some(hit) = self.lookup(key).await {
            tracing::debug!(query = key, candidates = hit.len(), "candidate cache hit");
            return Ok(hit);
        }

        tracing::debug!(query = key, "candidate cache miss");
        let candidates = self.search.search(key).await?;
        self.store(key, candidates.clone()).await;
        Ok(candidates)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    async fn lookup(&self, key: &str) -> Option<Vec<Candidate>> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) => now - entry.inserted_at >= self.ttl,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }

        state.tick += 1;
        let tick = state.tick;
        let entry = state.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.candidates.clone())
    }

    async fn store(&self, key: &str, candidates: Vec<Candidate>) {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.entries.contains_key(key) {
            let ttl = self.ttl;
            state.entries.retain(|_, e| now - e.inserted_at < ttl);

            if state.entries.len() >= self.capacity {
                let lru = state
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(lru) = lru {
                    tracing::debug!(evicted = %lru, "candidate cache full; evicting");
                    state.entries.remove(&lru);
                }
            }
        }

        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                candidates,
                inserted_at: now,
                last_used: tick,
            },
        );
    }
}
