use crate::domain::entities::client::{Client, ClientDetails};
use crate::domain::value_objects::ids::ClientId;
use crate::infrastructure::db::dto::{ClientRow, NewClientRow};
use crate::infrastructure::db::stores::client_store::{ClientRepositoryError, ClientStore};
use std::sync::Arc;

pub struct ClientRepository {
    store: Arc<dyn ClientStore>,
}

impl ClientRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Create a client; the store assigns its ID and timestamps.
    pub async fn insert(&self, details: &ClientDetails) -> Result<Client, ClientRepositoryError> {
        let dto = NewClientRow::from_details(details);
        let stored = self.store.insert(&dto).await?;

        Ok(stored.into_client())
    }

    /// Fetch a client by its ID. Returns `None` if it doesn't exist.
    pub async fn get(&self, client_id: ClientId) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get(client_id.0).await?;
        Ok(row.map(ClientRow::into_client))
    }

    pub async fn get_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get_by_tax_id(tax_id).await?;
        Ok(row.map(ClientRow::into_client))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get_by_email(email).await?;
        Ok(row.map(ClientRow::into_client))
    }

    /// List every client in store order.
    pub async fn list(&self) -> Result<Vec<Client>, ClientRepositoryError> {
        let rows = self.store.list().await?;
        Ok(rows.into_iter().map(ClientRow::into_client).collect())
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Client>, ClientRepositoryError> {
        let rows = self.store.search_by_name(fragment).await?;
        Ok(rows.into_iter().map(ClientRow::into_client).collect())
    }

    /// Update a client and return what was actually stored in the database.
    pub async fn update(&self, client: &Client) -> Result<Client, ClientRepositoryError> {
        let dto = ClientRow::from_client(client);
        let stored = self.store.update(&dto).await?;

        Ok(stored.into_client())
    }

    /// Delete a client by its ID. Returns `NotFound` if it doesn't exist.
    pub async fn delete(&self, client_id: ClientId) -> Result<(), ClientRepositoryError> {
        self.store.delete(client_id.0).await
    }

    pub async fn lock_unique_keys_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
        email: &str,
    ) -> Result<(), ClientRepositoryError> {
        self.store.lock_unique_keys_tx(tx, tax_id, email).await
    }

    pub async fn get_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        client_id: ClientId,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get_tx(tx, client_id.0).await?;
        Ok(row.map(ClientRow::into_client))
    }

    pub async fn get_by_tax_id_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get_by_tax_id_tx(tx, tax_id).await?;
        Ok(row.map(ClientRow::into_client))
    }

    pub async fn get_by_email_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self.store.get_by_email_tx(tx, email).await?;
        Ok(row.map(ClientRow::into_client))
    }

    pub async fn insert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        details: &ClientDetails,
    ) -> Result<Client, ClientRepositoryError> {
        let dto = NewClientRow::from_details(details);
        let stored = self.store.insert_tx(tx, &dto).await?;
        Ok(stored.into_client())
    }

    pub async fn update_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        client: &Client,
    ) -> Result<Client, ClientRepositoryError> {
        let dto = ClientRow::from_client(client);
        let stored = self.store.update_tx(tx, &dto).await?;
        Ok(stored.into_client())
    }
}
