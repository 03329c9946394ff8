//! Connection handling against a live PostgreSQL (`DATABASE_URL`). Run with
//! `cargo test -- --ignored` once the database is up.

use std::time::Duration;

use anyhow::{Context, Result};

use uptime_monitor::db::Database;

fn database_url() -> Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL"]
async fn healthy_pool_is_kept() -> Result<()> {
    // ---
    let db = Database::connect(&database_url()?, 2).await?;
    let first = db.pool().await?;
    let second = db.pool().await?;

    assert_eq!(db.generation().await, 0);
    assert!(!first.is_closed());
    assert!(!second.is_closed());
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL; set DATABASE_URL"]
async fn busy_pool_is_returned_without_replacement() -> Result<()> {
    // ---
    let db = Database::connect(&database_url()?, 1).await?;
    let original = db.pool().await?;
    let held = original.acquire().await?;

    // Every connection is checked out; the handle must come back at once.
    let pool = tokio::time::timeout(Duration::from_secs(1), db.pool())
        .await
        .context("pool() blocked on a busy pool")??;

    assert_eq!(db.generation().await, 0);
    assert!(!original.is_closed());
    assert!(!pool.is_closed());

    drop(held);
    sqlx::query("SELECT 1").execute(&db.pool().await?).await?;
    assert_eq!(db.generation().await, 0);
    Ok(())
}
