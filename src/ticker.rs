//! Periodic gap-filling job.
//!
//! Spawned exactly once per process. The first tick fires immediately so a
//! restart backfills right away; afterwards it runs every tick interval.
//! Failures are logged and retried on the next tick, never sooner.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::GapFiller;

// ---

pub fn spawn(filler: Arc<GapFiller>, every: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            tick(&filler).await;
        }
    })
}

async fn tick(filler: &GapFiller) {
    // ---
    match filler.fill_gaps().await {
        Ok(report) if report.created > 0 => {
            tracing::info!(
                "Filled {} uptime records ({} attempted)",
                report.created,
                report.attempted
            );
        }
        Ok(report) => {
            tracing::debug!("Uptime history current ({} attempted)", report.attempted);
        }
        Err(e) => {
            tracing::error!("Gap fill failed, retrying next tick: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::probe::SyntheticProbe;
    use crate::store::MemoryExecutor;
    use crate::{IntervalClock, TimeSeriesStore};

    #[tokio::test]
    async fn test_first_tick_fills_immediately() {
        // ---
        let executor = Arc::new(MemoryExecutor::new());
        let store = TimeSeriesStore::new(
            executor.clone(),
            IntervalClock::default(),
            Arc::new(SyntheticProbe),
        );
        let filler = Arc::new(GapFiller::new(Arc::new(store), 10));

        let handle = spawn(filler, Duration::from_secs(3_600));
        for _ in 0..100 {
            if !executor.snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(executor.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_tick_does_not_stop_job() {
        // ---
        let executor = Arc::new(MemoryExecutor::new());
        executor.set_available(false);
        let store = TimeSeriesStore::new(
            executor.clone(),
            IntervalClock::default(),
            Arc::new(SyntheticProbe),
        );
        let filler = GapFiller::new(Arc::new(store), 10);

        tick(&filler).await;
        executor.set_available(true);
        tick(&filler).await;

        assert_eq!(executor.snapshot().len(), 1);
    }
}
