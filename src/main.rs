//! Application entry point for the `uptime-monitor` service.
//!
//! This binary orchestrates the full startup sequence for the uptime API,
//! including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Applying pending SQL migrations
//! - Spawning the single gap-filling job
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! Running `uptime-monitor migrate` applies migrations and exits.
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `WORKER_NUM` (optional) – runtime worker threads (default: 2)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the full list.
use std::{env, sync::Arc};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use uptime_monitor::{
    aggregation::DEFAULT_BUCKET_WIDTH_SECS, config, db::Database, migrate, probe::SyntheticProbe,
    routes, store::PgExecutor, ticker, AggregationQueryBuilder, Config, GapFiller, IntervalClock,
    TimeSeriesStore,
};

// ---

fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.worker_num)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(run(cfg, migrate_only))
}

async fn run(cfg: Config, migrate_only: bool) -> Result<()> {
    // ---
    tracing::info!("Attempting to connect to database");

    let db = Database::connect(&cfg.db_url, cfg.db_pool_max)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database '{}'",
                config::mask_db_url(&cfg.db_url)
            )
        })?;
    let db = Arc::new(db);

    tracing::info!("Successfully connected to database");

    migrate::run_migrations(&db.pool().await?, &cfg.migrations_dir).await?;
    if migrate_only {
        return Ok(());
    }

    let store = Arc::new(TimeSeriesStore::new(
        Arc::new(PgExecutor::new(db.clone())),
        IntervalClock::new(cfg.interval_secs),
        Arc::new(SyntheticProbe),
    ));

    // Only this task writes; request handlers are read-only.
    let filler = Arc::new(GapFiller::new(store.clone(), cfg.gap_fill_cap));
    let job = ticker::spawn(filler, cfg.tick_interval);

    // Build app from routes gateway (EMBP)
    let queries =
        AggregationQueryBuilder::new(cfg.aggregation_threshold_secs, DEFAULT_BUCKET_WIDTH_SECS);
    let table = routes::route_table(store, queries)?;
    let app = routes::router(Arc::new(table));

    tracing::info!("Listening on {}", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    job.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ---

/// Install the process-wide `tracing` subscriber. Call once, before the
/// config is loaded, so config errors are logged too.
///
/// Filtering: `RUST_LOG` wins when set. Otherwise `AXUM_LOG_LEVEL` picks the
/// level (default `debug`) and sqlx statement logging is held at `warn`, so
/// the gap filler's per-interval inserts stay out of the log.
///
/// `AXUM_SPAN_EVENTS=full|enter_exit` widens span events beyond CLOSE, and
/// `FORCE_COLOR` overrides TTY detection for ANSI output.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
