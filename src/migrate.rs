//! Database migrations for `uptime-monitor`.
//!
//! Applies every `*.sql` file in the migrations directory in lexical filename
//! order. Each file runs in its own transaction and is recorded in
//! `schema_migrations`, so a file is applied at most once. The first failure
//! aborts the run; later files are left untouched.

use std::path::{Path, PathBuf};

use sqlx::PgPool;

use crate::error::MigrationError;

// ---

/// Ordered `.sql` files in `dir`.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, MigrationError> {
    // ---
    if !dir.is_dir() {
        return Err(MigrationError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| MigrationError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| MigrationError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(MigrationError::Empty(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Apply pending migrations from `dir`. Returns how many were applied.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<usize, MigrationError> {
    // ---
    tracing::info!("Starting migrations from: {}", dir.display());
    let files = discover(dir)?;
    tracing::info!("Found {} migration files", files.len());

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            filename   TEXT        PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(pool)
    .await
    .map_err(|source| MigrationError::Apply {
        file: "schema_migrations".into(),
        source,
    })?;

    let mut applied = 0;
    for path in files {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sql = std::fs::read_to_string(&path).map_err(|source| MigrationError::Read {
            path: path.clone(),
            source,
        })?;

        if apply(pool, &file, &sql)
            .await
            .map_err(|source| MigrationError::Apply {
                file: file.clone(),
                source,
            })?
        {
            tracing::info!("Applied migration {} ({} bytes)", file, sql.len());
            applied += 1;
        } else {
            tracing::debug!("Migration {} already applied", file);
        }
    }

    tracing::info!("Migrations complete, {} applied", applied);
    Ok(applied)
}

/// Run one file unless already recorded. `Ok(false)` means skipped.
async fn apply(pool: &PgPool, file: &str, sql: &str) -> Result<bool, sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    let done: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM schema_migrations WHERE filename = $1")
            .bind(file)
            .fetch_optional(&mut *tx)
            .await?;
    if done.is_some() {
        return Ok(false);
    }

    sqlx::raw_sql(sql).execute(&mut *tx).await?;
    sqlx::query("INSERT INTO schema_migrations (filename) VALUES ($1)")
        .bind(file)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
