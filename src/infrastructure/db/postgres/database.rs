use crate::infrastructure::db::database::{Database, DatabaseError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{PgConnection, Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled Postgres access for the client stores.
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Open a pool of at most `max_connections` and verify it with one round trip.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(connection_error)?;
        info!(max_connections, "postgres_pool_ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    /// Lend a pooled connection to `f` for the duration of its future.
    pub async fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        for<'c> F:
            FnOnce(&'c mut PgConnection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>,
        E: From<DatabaseError>,
    {
        let mut conn = self.pool.acquire().await.map_err(connection_error)?;
        f(&mut conn).await
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    /// Advisory locks taken with `pg_advisory_xact_lock` are released at
    /// either outcome.
    pub async fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        for<'c> F: FnOnce(
            &'c mut Transaction<'_, Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>,
        E: From<DatabaseError>,
    {
        let mut tx = self.pool.begin().await.map_err(connection_error)?;

        let value = match f(&mut tx).await {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    debug!(error = %rollback, "transaction_rollback_failed");
                }
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(value)
    }
}

fn connection_error(e: sqlx::Error) -> DatabaseError {
    DatabaseError::Connection(e.to_string())
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn execute(&self, query: &str) -> Result<u64, DatabaseError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }
}
