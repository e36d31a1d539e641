use std::sync::Arc;

use crate::infrastructure::db::database::{Database, DatabaseError};
use crate::infrastructure::db::memory::ClientStoreMemory;
use crate::infrastructure::db::postgres::client_store_postgres::ClientStorePostgres;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::repositories::client_repository::ClientRepository;
use crate::infrastructure::db::stores::client_store::ClientStore;
use std::future::Future;
use std::pin::Pin;

#[derive(Clone)]
pub struct Repositories {
    /// Present only for backends that support transactions.
    pub tx: Option<Arc<PostgresDatabase>>,
    pub client: Arc<ClientRepository>,
}

impl Repositories {
    /// Build all repositories backed by Postgres stores.
    pub fn postgres(db: Arc<PostgresDatabase>) -> Self {
        let client_store = Arc::new(ClientStorePostgres::new(db.clone()));

        Self {
            tx: Some(db),
            client: Arc::new(ClientRepository::new(client_store)),
        }
    }

    /// Build repositories over process-local stores. No transactions are available.
    pub fn memory() -> Self {
        Self::with_client_store(Arc::new(ClientStoreMemory::new()))
    }

    /// Build repositories over an arbitrary client store, without transactions.
    pub fn with_client_store(store: Arc<dyn ClientStore>) -> Self {
        Self {
            tx: None,
            client: Arc::new(ClientRepository::new(store)),
        }
    }

    pub fn supports_tx(&self) -> bool {
        self.tx.is_some()
    }

    /// Run multiple repository operations inside a single transaction.
    pub async fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        for<'c> F: FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>,
        E: From<DatabaseError>,
    {
        let Some(db) = self.tx.as_ref() else {
            return Err(DatabaseError::Connection("tx_unavailable".to_string()).into());
        };
        db.with_tx(f).await
    }

    /// Execute a raw SQL statement outside a transaction. Process-local
    /// backends have nothing to check and always succeed.
    pub async fn execute(&self, query: &str) -> Result<u64, DatabaseError> {
        match self.tx.as_ref() {
            Some(db) => db.execute(query).await,
            None => Ok(0),
        }
    }
}
