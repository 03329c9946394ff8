//! Adaptive query shape for `/api/monitoring`.
//!
//! Narrow ranges return raw interval rows. Wide ranges (both bounds present
//! and at least `threshold` seconds apart) collapse into hourly buckets: sums
//! for the counts, min/max for the runtime extremes, mean for the runtime
//! average.

use sqlx::{Postgres, QueryBuilder};

/// Seven days, in seconds.
pub const DEFAULT_BUCKET_THRESHOLD_SECS: i64 = 604_800;

/// One hour, in seconds.
pub const DEFAULT_BUCKET_WIDTH_SECS: i64 = 3_600;

pub(crate) const TABLE: &str = "uptime_history";

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Raw,
    Bucketed { width: i64 },
}

/// A built query: the shape plus its inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationQuery {
    pub mode: QueryMode,
    pub ts_min: Option<i64>,
    pub ts_max: Option<i64>,
}

impl AggregationQuery {
    // ---
    pub fn is_bucketed(&self) -> bool {
        matches!(self.mode, QueryMode::Bucketed { .. })
    }

    /// Whether `t` falls inside the (optional) bounds.
    pub fn contains(&self, t: i64) -> bool {
        self.ts_min.map_or(true, |min| t >= min) && self.ts_max.map_or(true, |max| t <= max)
    }

    /// Render as parameterized Postgres SQL; bounds are bound, never inlined.
    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        // ---
        let mut qb = match self.mode {
            QueryMode::Raw => QueryBuilder::new(format!(
                "SELECT t, p::bigint AS p, f::bigint AS f, rl, ra, rh FROM {TABLE}"
            )),
            QueryMode::Bucketed { width } => QueryBuilder::new(format!(
                "SELECT (floor(t::double precision / {width}) * {width})::bigint AS t, \
                 SUM(p)::bigint AS p, \
                 SUM(f)::bigint AS f, \
                 MIN(rl) AS rl, \
                 AVG(ra) AS ra, \
                 MAX(rh) AS rh \
                 FROM {TABLE}"
            )),
        };

        let mut separator = " WHERE ";
        if let Some(min) = self.ts_min {
            qb.push(separator).push("t >= ").push_bind(min);
            separator = " AND ";
        }
        if let Some(max) = self.ts_max {
            qb.push(separator).push("t <= ").push_bind(max);
        }

        if self.is_bucketed() {
            qb.push(" GROUP BY 1");
        }
        qb.push(" ORDER BY t ASC");
        qb
    }
}

/// Chooses between raw and bucketed queries.
#[derive(Debug, Clone, Copy)]
pub struct AggregationQueryBuilder {
    threshold: i64,
    bucket_width: i64,
}

impl AggregationQueryBuilder {
    // ---
    pub fn new(threshold: i64, bucket_width: i64) -> Self {
        Self {
            threshold,
            bucket_width,
        }
    }

    pub fn build(&self, ts_min: Option<i64>, ts_max: Option<i64>) -> AggregationQuery {
        // ---
        let mode = match (ts_min, ts_max) {
            (Some(min), Some(max)) if max.saturating_sub(min) >= self.threshold => {
                QueryMode::Bucketed {
                    width: self.bucket_width,
                }
            }
            _ => QueryMode::Raw,
        };

        AggregationQuery {
            mode,
            ts_min,
            ts_max,
        }
    }
}

impl Default for AggregationQueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_THRESHOLD_SECS, DEFAULT_BUCKET_WIDTH_SECS)
    }
}
