//! Owned PostgreSQL handle with an explicit, single-shot reconnect.
//!
//! The pool is created once in `main.rs` and passed by `Arc` to whoever needs
//! it. [`Database::pool`] runs a liveness probe before handing the pool out.
//! Only a broken connection triggers a rebuild, and it happens at most once
//! per call; a second failure is returned to the caller.
//!
//! Rebuilds are keyed by a generation counter: callers that saw the same
//! broken pool share one replacement instead of each tearing down the pool
//! another caller just installed.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::RwLock;

use crate::error::StorageError;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// ---

struct Slot {
    generation: u64,
    pool: PgPool,
}

pub struct Database {
    url: String,
    max_connections: u32,
    slot: RwLock<Slot>,
}

impl Database {
    // ---
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        // ---
        let pool = pool_options(max_connections).connect(url).await?;
        Ok(Database {
            url: url.to_string(),
            max_connections,
            slot: RwLock::new(Slot { generation: 0, pool }),
        })
    }

    /// How many times the pool has been replaced since `connect`.
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.generation
    }

    /// A pool that just answered a liveness probe.
    ///
    /// A pool with every connection checked out is busy, not broken, and is
    /// returned without probing.
    pub async fn pool(&self) -> Result<PgPool, StorageError> {
        // ---
        let (seen, pool) = {
            let slot = self.slot.read().await;
            (slot.generation, slot.pool.clone())
        };

        if is_saturated(&pool, self.max_connections) {
            return Ok(pool);
        }

        let Err(e) = ping(&pool).await else {
            return Ok(pool);
        };
        if !needs_reconnect(&e) {
            return Err(e.into());
        }

        tracing::warn!("Database liveness probe failed: {}", e);
        let pool = self.reconnect(seen).await?;
        ping(&pool).await?;
        Ok(pool)
    }

    /// Replace the pool unless another caller already replaced generation
    /// `seen`. The stale pool is closed off the request path.
    async fn reconnect(&self, seen: u64) -> Result<PgPool, StorageError> {
        // ---
        let mut slot = self.slot.write().await;
        if slot.generation != seen {
            return Ok(slot.pool.clone());
        }

        tracing::warn!("Reconnecting to database");
        let fresh = pool_options(self.max_connections).connect_lazy(&self.url)?;
        let stale = std::mem::replace(&mut slot.pool, fresh);
        slot.generation += 1;
        tokio::spawn(async move { stale.close().await });

        tracing::info!(generation = slot.generation, "Database pool replaced");
        Ok(slot.pool.clone())
    }
}

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

fn is_saturated(pool: &PgPool, max_connections: u32) -> bool {
    pool.size() >= max_connections && pool.num_idle() == 0
}

/// Errors that mean the connection itself is gone. Timeouts and query
/// errors leave the pool in place.
fn needs_reconnect(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
