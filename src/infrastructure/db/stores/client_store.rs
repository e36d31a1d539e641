use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{ClientRow, NewClientRow};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRepositoryError {
    NotFound,
    /// A storage-level uniqueness constraint rejected the write.
    Conflict,
    StorageUnavailable,
}

impl From<DatabaseError> for ClientRepositoryError {
    fn from(_: DatabaseError) -> Self {
        ClientRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Fetch a client by its ID. Returns `None` if it doesn't exist.
    async fn get(&self, client_id: i64) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// Fetch the client holding `tax_id`, if any.
    async fn get_by_tax_id(&self, tax_id: &str) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// Fetch the client holding `email`, if any.
    async fn get_by_email(&self, email: &str) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// List every client in ascending ID order.
    async fn list(&self) -> Result<Vec<ClientRow>, ClientRepositoryError>;
    /// Case-insensitive substring search over first, last and company name.
    /// An empty fragment matches every client.
    async fn search_by_name(&self, fragment: &str) -> Result<Vec<ClientRow>, ClientRepositoryError>;
    /// Create a client, assigning its ID and timestamps, and return exactly what was stored.
    async fn insert(&self, row: &NewClientRow) -> Result<ClientRow, ClientRepositoryError>;
    /// Update a client and return exactly what was stored. `created_at` is never written.
    async fn update(&self, row: &ClientRow) -> Result<ClientRow, ClientRepositoryError>;
    /// Delete a client by its ID. Returns `NotFound` if it doesn't exist.
    async fn delete(&self, client_id: i64) -> Result<(), ClientRepositoryError>;

    /// Serialize writers touching the same tax ID or email until the transaction ends.
    async fn lock_unique_keys_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
        email: &str,
    ) -> Result<(), ClientRepositoryError>;
    /// Fetch a client by ID inside an existing transaction.
    async fn get_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        client_id: i64,
    ) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// Fetch the client holding `tax_id` inside an existing transaction.
    async fn get_by_tax_id_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// Fetch the client holding `email` inside an existing transaction.
    async fn get_by_email_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError>;
    /// Create a client inside an existing transaction and return the stored row.
    async fn insert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        row: &NewClientRow,
    ) -> Result<ClientRow, ClientRepositoryError>;
    /// Update a client inside an existing transaction and return the stored row.
    async fn update_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        row: &ClientRow,
    ) -> Result<ClientRow, ClientRepositoryError>;
}
