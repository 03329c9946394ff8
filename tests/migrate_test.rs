//! Migration runner against a live PostgreSQL (`DATABASE_URL`). Each test
//! works inside its own throwaway schema. Run with `cargo test -- --ignored`.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tempfile::TempDir;

use uptime_monitor::{migrate, MigrationError};

// ---

/// A pool whose `search_path` points at a freshly created schema.
async fn scratch_pool(schema: &str) -> Result<PgPool> {
    // ---
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let admin = PgPool::connect(&url).await?;
    sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"))
        .execute(&admin)
        .await?;
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)?.options([("search_path", schema)]);
    Ok(PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?)
}

async fn drop_schema(pool: PgPool, schema: &str) -> Result<()> {
    // ---
    sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}

fn write_migrations(files: &[(&str, &str)]) -> Result<TempDir> {
    // ---
    let dir = tempfile::tempdir()?;
    for (name, sql) in files {
        std::fs::write(dir.path().join(name), sql)?;
    }
    Ok(dir)
}

async fn tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    // ---
    let names = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = $1 ORDER BY table_name",
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

async fn recorded(pool: &PgPool) -> Result<Vec<String>> {
    // ---
    let names = sqlx::query_scalar("SELECT filename FROM schema_migrations ORDER BY filename")
        .fetch_all(pool)
        .await?;
    Ok(names)
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL"]
async fn first_failure_stops_the_run() -> Result<()> {
    // ---
    let schema = format!("migrate_abort_{}", std::process::id());
    let pool = scratch_pool(&schema).await?;
    let dir = write_migrations(&[
        ("001_a.sql", "CREATE TABLE pa (id INTEGER);"),
        ("002_b.sql", "CREATE TABLE pb (id NOT_A_TYPE);"),
        ("003_c.sql", "CREATE TABLE pc (id INTEGER);"),
    ])?;

    let result = migrate::run_migrations(&pool, dir.path()).await;
    match result {
        Err(MigrationError::Apply { ref file, .. }) => assert_eq!(file, "002_b.sql"),
        other => panic!("expected 002_b.sql to fail, got {other:?}"),
    }

    assert_eq!(tables(&pool, &schema).await?, vec!["pa", "schema_migrations"]);
    assert_eq!(recorded(&pool).await?, vec!["001_a.sql"]);

    drop_schema(pool, &schema).await
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL"]
async fn second_run_applies_nothing() -> Result<()> {
    // ---
    let schema = format!("migrate_rerun_{}", std::process::id());
    let pool = scratch_pool(&schema).await?;
    // Neither file is re-runnable, so a second application would error.
    let dir = write_migrations(&[
        ("001_a.sql", "CREATE TABLE pa (id INTEGER);"),
        ("002_b.sql", "INSERT INTO pa (id) VALUES (1);"),
    ])?;

    assert_eq!(migrate::run_migrations(&pool, dir.path()).await?, 2);
    assert_eq!(migrate::run_migrations(&pool, dir.path()).await?, 0);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pa").fetch_one(&pool).await?;
    assert_eq!(rows, 1);
    assert_eq!(recorded(&pool).await?, vec!["001_a.sql", "002_b.sql"]);

    drop_schema(pool, &schema).await
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL"]
async fn shipped_migrations_create_uptime_history() -> Result<()> {
    // ---
    let schema = format!("migrate_shipped_{}", std::process::id());
    let pool = scratch_pool(&schema).await?;
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");

    migrate::run_migrations(&pool, &dir).await?;
    assert!(tables(&pool, &schema).await?.contains(&"uptime_history".to_string()));

    drop_schema(pool, &schema).await
}
