//! Task-scoped refinement cache.
//!
//! Holds the round-1 context (query, bundle, verdict) between the two
//! Research→Analysis rounds of a task. This is not a general cache: one
//! entry per task, written exactly once by `begin_round_two` and consumed by
//! a destructive read in `complete_round_two`. Entry count is bounded by the
//! number of in-flight tasks, so there is no LRU or size-based eviction —
//! only a TTL sweep so abandoned tasks cannot leak entries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::types::{AnalysisVerdict, ResearchBundle};

/// Round-1 state parked between feedback loop rounds.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub task_id: Uuid,
    pub query: String,
    pub prior_bundle: ResearchBundle,
    pub prior_verdict: AnalysisVerdict,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(
        task_id: Uuid,
        query: impl Into<String>,
        prior_bundle: ResearchBundle,
        prior_verdict: AnalysisVerdict,
        ttl: Duration,
    ) -> Self {
        Self {
            task_id,
            query: query.into(),
            prior_bundle,
            prior_verdict,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Ephemeral per-task store with atomic put/take.
///
/// Access discipline is single-writer/single-reader per key, so the mutex is
/// only ever contended across tasks, never within one.
pub struct TaskCache {
    entries: Mutex<HashMap<Uuid, CacheEntry>>,
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store an entry. Returns `false` (and leaves the existing entry in
    /// place) when one is already pending for the task; the caller maps that
    /// to `RefinementAlreadyInProgress`.
    pub fn put(&self, entry: CacheEntry) -> bool {
        let mut entries = self.entries.lock();
        // An expired leftover does not block a fresh round.
        if let Some(existing) = entries.get(&entry.task_id) {
            if !existing.is_expired() {
                return false;
            }
        }
        entries.insert(entry.task_id, entry);
        true
    }

    /// Destructive read: the entry is removed whether or not it is returned.
    /// Expired entries are dropped and reported as absent.
    pub fn take(&self, task_id: Uuid) -> Option<CacheEntry> {
        let entry = self.entries.lock().remove(&task_id)?;
        if entry.is_expired() {
            tracing::debug!(%task_id, "refinement cache entry expired before read");
            return None;
        }
        Some(entry)
    }

    /// Drop an entry without reading it (task cancelled or failed mid-loop).
    pub fn discard(&self, task_id: Uuid) {
        self.entries.lock().remove(&task_id);
    }

    /// Sweep entries past their TTL.
    pub fn evict_expired(&self) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired refinement cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
