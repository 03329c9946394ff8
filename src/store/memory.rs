//! In-process [`IntervalExecutor`] with the same semantics as the SQL one.
//!
//! Used by the test suite and for running the API without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::IntervalExecutor;
use crate::aggregation::{AggregationQuery, QueryMode};
use crate::error::StorageError;
use crate::models::UptimeRecord;

// ---

pub struct MemoryExecutor {
    rows: Mutex<BTreeMap<i64, UptimeRecord>>,
    available: AtomicBool,
}

impl MemoryExecutor {
    // ---
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Seed rows directly, bypassing alignment checks.
    pub fn with_records(records: impl IntoIterator<Item = UptimeRecord>) -> Self {
        // ---
        let executor = Self::new();
        {
            let mut rows = executor.lock();
            for record in records {
                rows.insert(record.t, record);
            }
        }
        executor
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every stored row, ascending by `t`.
    pub fn snapshot(&self) -> Vec<UptimeRecord> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, UptimeRecord>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), StorageError> {
        // ---
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store is offline".into()))
        }
    }
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntervalExecutor for MemoryExecutor {
    // ---
    async fn max_timestamp(&self) -> Result<Option<i64>, StorageError> {
        self.check()?;
        Ok(self.lock().keys().next_back().copied())
    }

    async fn insert_if_absent(&self, record: &UptimeRecord) -> Result<bool, StorageError> {
        // ---
        self.check()?;
        let mut rows = self.lock();
        if rows.contains_key(&record.t) {
            return Ok(false);
        }
        rows.insert(record.t, record.clone());
        Ok(true)
    }

    async fn fetch(&self, query: &AggregationQuery) -> Result<Vec<UptimeRecord>, StorageError> {
        // ---
        self.check()?;
        let rows = self.lock();
        let matching = rows.values().filter(|r| query.contains(r.t));

        let records = match query.mode {
            QueryMode::Raw => matching.cloned().collect(),
            QueryMode::Bucketed { width } => bucket(matching, width),
        };
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check()
    }
}

/// Collapse ascending rows into `width`-second buckets.
fn bucket<'a>(rows: impl Iterator<Item = &'a UptimeRecord>, width: i64) -> Vec<UptimeRecord> {
    // ---
    let mut buckets: Vec<(UptimeRecord, usize)> = Vec::new();

    for r in rows {
        let start = r.t.div_euclid(width) * width;
        match buckets.last_mut() {
            Some((acc, n)) if acc.t == start => {
                acc.p += r.p;
                acc.f += r.f;
                acc.rl = acc.rl.min(r.rl);
                acc.ra += r.ra;
                acc.rh = acc.rh.max(r.rh);
                *n += 1;
            }
            _ => buckets.push((UptimeRecord { t: start, ..r.clone() }, 1)),
        }
    }

    buckets
        .into_iter()
        .map(|(mut acc, n)| {
            acc.ra /= n as f64;
            acc
        })
        .collect()
}
