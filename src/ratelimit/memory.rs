//! In-process admission store.
//!
//! Runs the same sliding-window-log algorithm as the Redis admission script,
//! serialized by a single mutex and timed by the store's own monotonic clock.
//! It only coordinates callers sharing one process; use [`RedisStore`] to
//! share quotas across instances.
//!
//! [`RedisStore`]: super::RedisStore

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::key::RecordKey;
use super::script::{Admission, AdmissionRequest};
use super::store::AdmissionStore;
use crate::error::Result;

/// One identity's request log.
struct Record {
    /// (score, token) pairs in ascending score order
    entries: Vec<(f64, String)>,
    expires_at: Instant,
}

/// An admission store kept in process memory.
pub struct MemoryStore {
    /// Origin of the store clock; scores are seconds since this instant
    epoch: Instant,
    records: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored for a key, including entries that
    /// have aged out of a window but were not yet evicted by a decision.
    pub fn record_len(&self, key: &RecordKey) -> usize {
        let now = Instant::now();
        let records = self.records.lock();
        records
            .get(key.as_str())
            .filter(|r| r.expires_at > now)
            .map(|r| r.entries.len())
            .unwrap_or(0)
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        let now = Instant::now();
        let records = self.records.lock();
        records.values().filter(|r| r.expires_at > now).count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn admit(&self, request: &AdmissionRequest) -> Result<Admission> {
        let mut records = self.records.lock();

        let instant = Instant::now();
        let now = instant.duration_since(self.epoch).as_secs_f64();
        let cutoff = now - request.window_secs();

        if records
            .get(request.key.as_str())
            .is_some_and(|r| r.expires_at <= instant)
        {
            records.remove(request.key.as_str());
        }

        let record = records
            .entry(request.key.as_str().to_string())
            .or_insert_with(|| Record {
                entries: Vec::new(),
                expires_at: instant,
            });

        record.entries.retain(|(score, _)| *score >= cutoff);

        let admission = if (record.entries.len() as u64) < request.limit {
            record.entries.push((now, request.token.clone()));
            Admission::Allowed
        } else {
            Admission::Denied
        };

        if record.entries.is_empty() {
            records.remove(request.key.as_str());
        } else {
            record.expires_at = instant + Duration::from_secs(request.ttl_secs());
        }

        Ok(admission)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
