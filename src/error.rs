//! Error taxonomy for the `uptime-monitor` service.
//!
//! Pure components (clock, query builder, stats) never fail. Everything that
//! touches configuration, the database or the migration directory reports one
//! of the typed errors below; `main.rs` folds them into `anyhow::Error`.

use std::path::PathBuf;

use thiserror::Error;

// ---

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Data-access failures surfaced by the store and the database handle.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("timestamp {timestamp} is not aligned to the {cadence}s cadence")]
    Misaligned { timestamp: i64, cadence: i64 },

    #[error("{field} = {value} does not fit an INTEGER column")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures while applying the ordered SQL migration files.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migrations directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no SQL files found in: {0}")]
    Empty(PathBuf),

    #[error("migration {file} failed: {source}")]
    Apply {
        file: String,
        #[source]
        source: sqlx::Error,
    },
}
