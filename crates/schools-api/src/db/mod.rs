//! # Persistence Layer
//!
//! Defines the [`SchoolRepository`] storage seam and its two stores:
//!
//! - [`schools::PgSchoolRepository`]: PostgreSQL via SQLx, used whenever a
//!   DSN is configured.
//! - [`memory::MemorySchoolRepository`]: in-process store with the same
//!   semantics. Used when no DSN is configured (state does not survive
//!   restarts) and by the handler test suite.
//!
//! ## Concurrency
//!
//! Updates are a compare-and-swap on `(id, version)` performed by a single
//! conditional write. Reads take no locks. No retries happen at this layer:
//! `EditConflict` and `NotFound` go back to the caller.
//!
//! Every database call is bounded by [`QUERY_TIMEOUT`]. Dropping the returned
//! future (for example when the client disconnects) drops the in-flight SQLx
//! call with it.

pub mod memory;
pub mod schools;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use schools_core::{FilterError, Filters, Metadata, School};
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DbConfig;

/// Upper bound on a single repository call.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on establishing and pinging the pool at startup.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors returned by a [`SchoolRepository`].
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No row matched, or the id can never be valid (`id < 1`).
    #[error("record not found")]
    NotFound,

    /// The conditional update matched no row at the expected version.
    #[error("edit conflict")]
    EditConflict,

    /// The call did not finish within the per-call deadline.
    #[error("database call exceeded {0:?}")]
    Timeout(Duration),

    /// An internal invariant was violated while building the query.
    #[error("invariant violated: {0}")]
    Invariant(#[from] FilterError),

    /// Any other failure reported by the database driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations for [`School`] records.
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    /// Persist a new record. `id`, `created_at` and `version` on the input
    /// are ignored; the returned record carries the assigned values.
    async fn insert(&self, school: &School) -> Result<School, RepositoryError>;

    /// Fetch one record.
    async fn get(&self, id: i64) -> Result<School, RepositoryError>;

    /// Overwrite the record identified by `school.id`, provided it is still
    /// at `school.version`. Returns the new version (`school.version + 1`).
    async fn update(&self, school: &School) -> Result<i32, RepositoryError>;

    /// Remove one record.
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    /// List records matching the text and mode filters, one page at a time.
    ///
    /// An empty `name`/`level` matches everything; otherwise every word of
    /// the filter must appear in the column (case-insensitive). The record's
    /// modes must be a superset of `mode`.
    async fn get_all(
        &self,
        name: &str,
        level: &str,
        mode: &[String],
        filters: &Filters,
    ) -> Result<(Vec<School>, Metadata), RepositoryError>;
}

/// Run `fut` under [`QUERY_TIMEOUT`].
pub(crate) async fn bounded<T, F>(fut: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result.map_err(RepositoryError::from),
        Err(_) => Err(RepositoryError::Timeout(QUERY_TIMEOUT)),
    }
}

/// Initialize the connection pool, verify connectivity and run migrations.
///
/// Returns `None` when no DSN is configured (in-memory mode).
/// Returns `Err` if a DSN is set but connecting, pinging or migrating fails.
pub async fn init_pool(config: &DbConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(dsn) = config.dsn.as_deref() else {
        tracing::warn!(
            "DATABASE_URL not set, running with the in-memory store. \
             Records will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.max_idle_conns.min(config.max_open_conns))
        .idle_timeout(Duration::from_secs(config.max_idle_time_secs))
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(dsn)
        .await?;

    match tokio::time::timeout(CONNECT_TIMEOUT, sqlx::query("SELECT 1").execute(&pool)).await {
        Ok(result) => {
            result?;
        }
        Err(_) => return Err(sqlx::Error::PoolTimedOut),
    }
    tracing::info!(
        max_open_conns = config.max_open_conns,
        max_idle_time_secs = config.max_idle_time_secs,
        "connected to PostgreSQL"
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_through_success() {
        let value = bounded(async { Ok::<_, sqlx::Error>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_maps_driver_errors() {
        let err = bounded(async { Err::<(), _>(sqlx::Error::RowNotFound) })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out_stalled_calls() {
        let err = bounded(async {
            tokio::time::sleep(QUERY_TIMEOUT * 2).await;
            Ok::<_, sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::Timeout(d) if d == QUERY_TIMEOUT));
    }

    #[tokio::test]
    async fn init_pool_without_dsn_is_in_memory_mode() {
        let config = DbConfig {
            dsn: None,
            ..DbConfig::default()
        };
        assert!(init_pool(&config).await.unwrap().is_none());
    }
}
