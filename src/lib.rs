//! Uptime monitoring service.
//!
//! Keeps a gap-free series of 15-minute probe intervals in PostgreSQL and
//! serves it over a small read-only HTTP API, switching to hourly buckets
//! for wide date ranges.
//!
//! Modules follow the Explicit Module Boundary Pattern (EMBP): each module
//! exposes a narrow surface, and the items other modules depend on are
//! re-exported from this gateway so that `routes/*.rs` only know about the
//! crate root, not about sibling module layout.

pub mod aggregation;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod gap_filler;
pub mod migrate;
pub mod models;
pub mod probe;
pub mod router;
pub mod routes;
pub mod stats;
pub mod store;
pub mod ticker;

pub use aggregation::{AggregationQuery, AggregationQueryBuilder, QueryMode};
pub use clock::IntervalClock;
pub use config::Config;
pub use error::{ConfigError, MigrationError, StorageError};
pub use gap_filler::{GapFillReport, GapFiller};
pub use models::{ProbeResult, UptimeRecord};
pub use stats::StatsSummary;
pub use store::{InsertOutcome, TimeSeriesStore};
