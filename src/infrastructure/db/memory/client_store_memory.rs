use crate::infrastructure::db::dto::{ClientRow, NewClientRow};
use crate::infrastructure::db::stores::client_store::{ClientRepositoryError, ClientStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

#[derive(Default)]
struct State {
    rows: BTreeMap<i64, ClientRow>,
    last_id: i64,
}

impl State {
    /// True when another row already holds `tax_id` or `email`.
    fn collides(&self, tax_id: &str, email: &str, exclude: Option<i64>) -> bool {
        self.rows
            .values()
            .filter(|r| Some(r.id) != exclude)
            .any(|r| r.tax_id == tax_id || r.email == email)
    }
}

/// A process-local client store used when no database is configured.
///
/// Every operation runs under one lock, so uniqueness is enforced atomically
/// at write time the same way the Postgres unique indexes enforce it. The store
/// has no transactions; callers that check before writing can still race.
#[derive(Default)]
pub struct ClientStoreMemory {
    state: Mutex<State>,
}

impl ClientStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, ClientRepositoryError> {
        self.state
            .lock()
            .map_err(|_| ClientRepositoryError::StorageUnavailable)
    }
}

fn tx_unsupported<T>() -> Result<T, ClientRepositoryError> {
    Err(ClientRepositoryError::StorageUnavailable)
}

#[async_trait]
impl ClientStore for ClientStoreMemory {
    async fn get(&self, client_id: i64) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Ok(self.state()?.rows.get(&client_id).cloned())
    }

    async fn get_by_tax_id(&self, tax_id: &str) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Ok(self
            .state()?
            .rows
            .values()
            .find(|r| r.tax_id == tax_id)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Ok(self
            .state()?
            .rows
            .values()
            .find(|r| r.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        Ok(self.state()?.rows.values().cloned().collect())
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        let needle = fragment.to_lowercase();
        Ok(self
            .state()?
            .rows
            .values()
            .filter(|r| {
                [&r.first_name, &r.last_name, &r.company_name]
                    .iter()
                    .any(|name| name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, row: &NewClientRow) -> Result<ClientRow, ClientRepositoryError> {
        let mut state = self.state()?;
        if state.collides(&row.tax_id, &row.email, None) {
            return Err(ClientRepositoryError::Conflict);
        }
        state.last_id += 1;
        let stored = row.clone().into_row(state.last_id, OffsetDateTime::now_utc());
        state.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, row: &ClientRow) -> Result<ClientRow, ClientRepositoryError> {
        let mut state = self.state()?;
        if state.collides(&row.tax_id, &row.email, Some(row.id)) {
            return Err(ClientRepositoryError::Conflict);
        }
        let existing = state
            .rows
            .get_mut(&row.id)
            .ok_or(ClientRepositoryError::NotFound)?;
        let created_at = existing.created_at;
        let updated_at = row.updated_at.max(existing.updated_at);
        *existing = ClientRow {
            created_at,
            updated_at,
            ..row.clone()
        };
        Ok(existing.clone())
    }

    async fn delete(&self, client_id: i64) -> Result<(), ClientRepositoryError> {
        self.state()?
            .rows
            .remove(&client_id)
            .map(|_| ())
            .ok_or(ClientRepositoryError::NotFound)
    }

    async fn lock_unique_keys_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _tax_id: &str,
        _email: &str,
    ) -> Result<(), ClientRepositoryError> {
        tx_unsupported()
    }

    async fn get_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _client_id: i64,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        tx_unsupported()
    }

    async fn get_by_tax_id_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _tax_id: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        tx_unsupported()
    }

    async fn get_by_email_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _email: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        tx_unsupported()
    }

    async fn insert_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _row: &NewClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        tx_unsupported()
    }

    async fn update_tx(
        &self,
        _tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        _row: &ClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        tx_unsupported()
    }
}
