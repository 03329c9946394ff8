//! Configuration loader for the `uptime-monitor` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Parse an optional numeric variable with a default value.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| {
                v.trim().parse::<$ty>().map_err(|e| ConfigError::Invalid {
                    name: $var_name,
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_var {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v: &String| !v.trim().is_empty())
            .ok_or(ConfigError::Missing($var_name))?
    };
}

/// Reject zero for a value that must be positive.
macro_rules! positive {
    ($var_name:expr, $value:expr) => {
        if $value == 0 {
            return Err(ConfigError::Invalid {
                name: $var_name,
                reason: "must be greater than zero".into(),
            });
        }
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Runtime worker threads serving requests.
    pub worker_num: usize,

    /// Period of the gap-filling job.
    pub tick_interval: Duration,

    /// Interval cadence in seconds.
    pub interval_secs: i64,

    /// Range width at which queries switch to hourly buckets.
    pub aggregation_threshold_secs: i64,

    /// Max intervals one gap-fill pass may process.
    pub gap_fill_cap: u32,

    /// Directory holding ordered `.sql` migrations.
    pub migrations_dir: PathBuf,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `SERVER_HOST` / `SERVER_PORT` – bind address (default: 0.0.0.0:8080)
/// - `WORKER_NUM` – runtime worker threads (default: 2)
/// - `UPTIME_TIMER_INTERVAL` – gap-fill period in ms (default: 900000)
/// - `UPTIME_INTERVAL_SECONDS` – interval cadence (default: 900)
/// - `AGGREGATION_THRESHOLD_SECONDS` – hourly bucketing threshold (default: 604800)
/// - `GAP_FILL_CAP` – intervals per gap-fill pass (default: 1000)
/// - `MIGRATIONS_DIR` – migrations directory (default: `migrations`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config, ConfigError> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let db_url = require_var!(lookup, "DATABASE_URL");
    let db_pool_max = parse_var!(lookup, "DB_POOL_MAX", u32, 5);
    let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = parse_var!(lookup, "SERVER_PORT", u16, 8080);
    let worker_num = parse_var!(lookup, "WORKER_NUM", usize, 2);
    let tick_ms = parse_var!(lookup, "UPTIME_TIMER_INTERVAL", u64, 900_000);
    let interval_secs = parse_var!(lookup, "UPTIME_INTERVAL_SECONDS", u32, 900);
    let threshold = parse_var!(lookup, "AGGREGATION_THRESHOLD_SECONDS", u32, 604_800);
    let gap_fill_cap = parse_var!(lookup, "GAP_FILL_CAP", u32, 1_000);
    let migrations_dir = lookup("MIGRATIONS_DIR").unwrap_or_else(|| "migrations".to_string());

    positive!("DB_POOL_MAX", db_pool_max);
    positive!("WORKER_NUM", worker_num);
    positive!("UPTIME_TIMER_INTERVAL", tick_ms);
    positive!("UPTIME_INTERVAL_SECONDS", interval_secs);
    positive!("GAP_FILL_CAP", gap_fill_cap);

    let listen_addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::Invalid {
            name: "SERVER_HOST",
            reason: e.to_string(),
        })?;

    Ok(Config {
        db_url,
        db_pool_max,
        listen_addr,
        worker_num,
        tick_interval: Duration::from_millis(tick_ms),
        interval_secs: i64::from(interval_secs),
        aggregation_threshold_secs: i64::from(threshold),
        gap_fill_cap,
        migrations_dir: PathBuf::from(migrations_dir),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL          : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX           : {}", self.db_pool_max);
        tracing::info!("  LISTEN_ADDR           : {}", self.listen_addr);
        tracing::info!("  WORKER_NUM            : {}", self.worker_num);
        tracing::info!("  UPTIME_TIMER_INTERVAL : {:?}", self.tick_interval);
        tracing::info!("  INTERVAL_SECONDS      : {}", self.interval_secs);
        tracing::info!("  AGGREGATION_THRESHOLD : {}", self.aggregation_threshold_secs);
        tracing::info!("  GAP_FILL_CAP          : {}", self.gap_fill_cap);
        tracing::info!("  MIGRATIONS_DIR        : {}", self.migrations_dir.display());
    }
}

/// Mask the password in a database URL for logging.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `postgres://host@...` has its only colon in the scheme.
            if !db_url[colon_pos..at_pos].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}
