//! Append/query operations on the interval table.
//!
//! [`TimeSeriesStore`] is the only component that writes rows. It pairs the
//! interval clock and a probe source with an [`IntervalExecutor`], which does
//! the actual I/O (Postgres in production, memory in tests).

use std::sync::Arc;

use async_trait::async_trait;

use crate::aggregation::AggregationQuery;
use crate::clock::IntervalClock;
use crate::error::StorageError;
use crate::models::UptimeRecord;
use crate::probe::ProbeSource;

mod memory;
mod postgres;

pub use memory::MemoryExecutor;
pub use postgres::PgExecutor;

// ---

/// Backend primitives the store is built on.
#[async_trait]
pub trait IntervalExecutor: Send + Sync {
    /// Largest stored `t`, if any.
    async fn max_timestamp(&self) -> Result<Option<i64>, StorageError>;

    /// Atomic insert-if-absent. `Ok(false)` means a row already held `t`.
    async fn insert_if_absent(&self, record: &UptimeRecord) -> Result<bool, StorageError>;

    /// Rows for `query`, ascending by `t`.
    async fn fetch(&self, query: &AggregationQuery) -> Result<Vec<UptimeRecord>, StorageError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Result of [`TimeSeriesStore::insert`]. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

pub struct TimeSeriesStore {
    executor: Arc<dyn IntervalExecutor>,
    clock: IntervalClock,
    probe: Arc<dyn ProbeSource>,
}

impl TimeSeriesStore {
    // ---
    pub fn new(
        executor: Arc<dyn IntervalExecutor>,
        clock: IntervalClock,
        probe: Arc<dyn ProbeSource>,
    ) -> Self {
        Self {
            executor,
            clock,
            probe,
        }
    }

    pub fn clock(&self) -> IntervalClock {
        self.clock
    }

    pub async fn last_timestamp(&self) -> Result<Option<i64>, StorageError> {
        self.executor.max_timestamp().await
    }

    /// Record a freshly sampled probe result at `t`. Never overwrites.
    pub async fn insert(&self, t: i64) -> Result<InsertOutcome, StorageError> {
        // ---
        if !self.clock.is_aligned(t) {
            return Err(StorageError::Misaligned {
                timestamp: t,
                cadence: self.clock.cadence(),
            });
        }

        let record = UptimeRecord::from_probe(t, self.probe.sample());
        if self.executor.insert_if_absent(&record).await? {
            tracing::trace!(t, "Inserted uptime record");
            Ok(InsertOutcome::Inserted)
        } else {
            tracing::trace!(t, "Uptime record already present");
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    pub async fn insert_current(&self) -> Result<InsertOutcome, StorageError> {
        self.insert(self.clock.current_interval()).await
    }

    pub async fn query(&self, query: &AggregationQuery) -> Result<Vec<UptimeRecord>, StorageError> {
        // ---
        let records = self.executor.fetch(query).await?;
        tracing::debug!(
            rows = records.len(),
            bucketed = query.is_bucketed(),
            "Fetched uptime history"
        );
        Ok(records)
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        self.executor.ping().await
    }
}
