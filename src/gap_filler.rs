//! Keeps the interval series contiguous up to the current interval.

use std::sync::Arc;

use crate::error::StorageError;
use crate::store::{InsertOutcome, TimeSeriesStore};

/// Upper bound on intervals processed per invocation.
pub const DEFAULT_GAP_FILL_CAP: u32 = 1_000;

// ---

/// Outcome of one [`GapFiller::fill_gaps`] call.
///
/// `attempted` counts every interval the filler targeted, including ones
/// that turned out to exist already. `created` is the subset that produced
/// a new row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapFillReport {
    pub attempted: u32,
    pub created: u32,
}

pub struct GapFiller {
    store: Arc<TimeSeriesStore>,
    cap: u32,
}

impl GapFiller {
    // ---
    pub fn new(store: Arc<TimeSeriesStore>, cap: u32) -> Self {
        Self { store, cap }
    }

    pub async fn fill_gaps(&self) -> Result<GapFillReport, StorageError> {
        // ---
        let now = self.store.clock().current_interval();
        self.fill_gaps_at(now).await
    }

    /// Fill from the last stored interval up to the interval containing `now`.
    pub async fn fill_gaps_at(&self, now: i64) -> Result<GapFillReport, StorageError> {
        // ---
        let clock = self.store.clock();
        let now = clock.align(now);
        let mut report = GapFillReport::default();

        let Some(last) = self.store.last_timestamp().await? else {
            report.record(self.store.insert(now).await?);
            tracing::debug!(t = now, "Seeded empty uptime history");
            return Ok(report);
        };

        let mut next = clock.align(last) + clock.cadence();
        while next <= now && report.attempted < self.cap {
            report.record(self.store.insert(next).await?);
            next += clock.cadence();
        }

        if next <= now {
            tracing::info!(
                cap = self.cap,
                remaining = (now - next) / clock.cadence() + 1,
                "Gap fill capped, remainder deferred to next tick"
            );
        }
        tracing::debug!(
            attempted = report.attempted,
            created = report.created,
            "Gap fill finished"
        );
        Ok(report)
    }
}

impl GapFillReport {
    fn record(&mut self, outcome: InsertOutcome) {
        // ---
        self.attempted += 1;
        if outcome == InsertOutcome::Inserted {
            self.created += 1;
        }
    }
}
