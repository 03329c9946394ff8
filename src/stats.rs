//! Summary statistics over a monitoring result set.

use serde::Serialize;

use crate::models::UptimeRecord;

// ---

/// Totals and runtime extremes for a range of records.
///
/// Runtime fields are `0` for an empty range rather than undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub fail_count: i64,
    pub pass_count: i64,
    pub runtime_min: f64,
    pub runtime_max: f64,
    pub runtime_avg: f64,
}

impl StatsSummary {
    // ---
    pub fn from_records(records: &[UptimeRecord]) -> Self {
        // ---
        if records.is_empty() {
            return Self::default();
        }

        let mut summary = StatsSummary {
            runtime_min: f64::INFINITY,
            runtime_max: f64::NEG_INFINITY,
            ..Self::default()
        };
        let mut runtime_sum = 0.0;

        for r in records {
            summary.pass_count += r.p;
            summary.fail_count += r.f;
            summary.runtime_min = summary.runtime_min.min(r.rl);
            summary.runtime_max = summary.runtime_max.max(r.rh);
            runtime_sum += r.ra;
        }

        summary.runtime_avg = runtime_sum / records.len() as f64;
        summary
    }
}
