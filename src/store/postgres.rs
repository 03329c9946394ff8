//! PostgreSQL-backed [`IntervalExecutor`].

use std::sync::Arc;

use async_trait::async_trait;

use super::IntervalExecutor;
use crate::aggregation::{AggregationQuery, TABLE};
use crate::db::Database;
use crate::error::StorageError;
use crate::models::UptimeRecord;

// ---

pub struct PgExecutor {
    db: Arc<Database>,
}

impl PgExecutor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IntervalExecutor for PgExecutor {
    // ---
    async fn max_timestamp(&self) -> Result<Option<i64>, StorageError> {
        // ---
        let pool = self.db.pool().await?;
        let max: Option<i64> = sqlx::query_scalar(&format!("SELECT MAX(t) FROM {TABLE}"))
            .fetch_one(&pool)
            .await?;
        Ok(max)
    }

    async fn insert_if_absent(&self, record: &UptimeRecord) -> Result<bool, StorageError> {
        // ---
        let p = integer_column("p", record.p)?;
        let f = integer_column("f", record.f)?;
        let pool = self.db.pool().await?;

        // Duplicate producers for the same interval collapse into a no-op here.
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {TABLE} (t, p, f, rl, ra, rh)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (t) DO NOTHING
            "#
        ))
        .bind(record.t)
        .bind(p)
        .bind(f)
        .bind(record.rl)
        .bind(record.ra)
        .bind(record.rh)
        .execute(&pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fetch(&self, query: &AggregationQuery) -> Result<Vec<UptimeRecord>, StorageError> {
        // ---
        let pool = self.db.pool().await?;
        let mut qb = query.to_sql();
        let records = qb.build_query_as::<UptimeRecord>().fetch_all(&pool).await?;
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        // ---
        self.db.pool().await.map(|_| ())
    }
}

/// `p` and `f` are `INTEGER` columns; bucketed sums are the only place they
/// widen to `i64`.
fn integer_column(field: &'static str, value: i64) -> Result<i32, StorageError> {
    i32::try_from(value).map_err(|_| StorageError::OutOfRange { field, value })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_counts_within_integer_range_bind() {
        // ---
        assert_eq!(integer_column("p", 12).unwrap(), 12);
        assert_eq!(integer_column("f", i32::MAX as i64).unwrap(), i32::MAX);
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        // ---
        let err = integer_column("p", i32::MAX as i64 + 1).unwrap_err();
        assert!(matches!(err, StorageError::OutOfRange { field: "p", value: 2_147_483_648 }));

        let err = integer_column("f", -(1 << 40)).unwrap_err();
        assert!(matches!(err, StorageError::OutOfRange { field: "f", .. }));
    }
}
