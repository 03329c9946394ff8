//! Simple data models for the uptime history.

use serde::{Deserialize, Serialize};

// ---

/// Result of one probe interval, before it is pinned to a timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    // ---
    pub passes: i64,
    pub fails: i64,
    pub runtime_low: f64,
    pub runtime_avg: f64,
    pub runtime_high: f64,
}

/// One stored interval (or one hourly bucket when aggregated).
///
/// Field names match the table columns and the JSON wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UptimeRecord {
    // ---
    /// Interval start, Unix seconds.
    pub t: i64,
    /// Pass count.
    pub p: i64,
    /// Fail count.
    pub f: i64,
    /// Runtime low.
    pub rl: f64,
    /// Runtime average.
    pub ra: f64,
    /// Runtime high.
    pub rh: f64,
}

impl UptimeRecord {
    // ---
    pub fn from_probe(t: i64, probe: ProbeResult) -> Self {
        // ---
        UptimeRecord {
            t,
            p: probe.passes,
            f: probe.fails,
            rl: probe.runtime_low,
            ra: probe.runtime_avg,
            rh: probe.runtime_high,
        }
    }
}
