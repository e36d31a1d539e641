// Client registry: validation, uniqueness and persistence of client records.

use crate::application::shared::uniqueness_guard::{
    Conflict, RepositoryLookup, TxLookup, UniquenessGuard,
};
use crate::domain::entities::client::{Client, ClientDetails, ClientPayload};
use crate::domain::services::client_validation::{validate_now, FieldViolations};
use crate::domain::value_objects::ids::ClientId;
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::repositories::client_repository::ClientRepository;
use crate::infrastructure::db::repositories::Repositories;
use crate::infrastructure::db::stores::client_store::ClientRepositoryError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientRegistryError {
    #[error("validation failed: {0}")]
    Validation(FieldViolations),
    #[error("{0}")]
    Duplicate(Conflict),
    #[error("Client not found with id: {0}")]
    NotFound(ClientId),
    /// Any store failure, including uniqueness violations the guard missed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<ClientRepositoryError> for ClientRegistryError {
    fn from(e: ClientRepositoryError) -> Self {
        ClientRegistryError::Storage(format!("{e:?}"))
    }
}

impl From<DatabaseError> for ClientRegistryError {
    fn from(e: DatabaseError) -> Self {
        ClientRegistryError::Storage(e.to_string())
    }
}

/// Maps a store-level `NotFound` on `id` to the registry's `NotFound`.
fn not_found_as(id: ClientId) -> impl Fn(ClientRepositoryError) -> ClientRegistryError {
    move |e| match e {
        ClientRepositoryError::NotFound => ClientRegistryError::NotFound(id),
        other => other.into(),
    }
}

/// Create, read, update, delete and search client records.
///
/// When the repositories carry a transaction handle, create and update run
/// their guard and write in one transaction under advisory locks on the
/// candidate tax ID and email. Otherwise the guard is a best-effort check and
/// concurrent writers are only stopped by the store's own constraints.
pub struct ClientRegistry {
    repos: Repositories,
}

impl ClientRegistry {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// All clients, in store order.
    pub async fn find_all(&self) -> Result<Vec<Client>, ClientRegistryError> {
        Ok(self.repos.client.list().await?)
    }

    pub async fn find_by_id(&self, id: ClientId) -> Result<Client, ClientRegistryError> {
        self.repos
            .client
            .get(id)
            .await?
            .ok_or(ClientRegistryError::NotFound(id))
    }

    /// Case-insensitive substring search over first, last and company name.
    /// An empty fragment returns every client.
    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Client>, ClientRegistryError> {
        Ok(self.repos.client.search_by_name(fragment).await?)
    }

    pub async fn create(&self, payload: &ClientPayload) -> Result<Client, ClientRegistryError> {
        // Step 1: Validate every field.
        let details = validate_now(payload).map_err(ClientRegistryError::Validation)?;

        // Step 2: Prefer the transactional path when the backend has one.
        if self.repos.supports_tx() {
            let repo = self.repos.client.clone();
            return self
                .repos
                .with_tx(move |tx| Box::pin(Self::create_in_tx(repo, tx, details)))
                .await;
        }

        // Step 3: Reject values another client already holds.
        let repo = &self.repos.client;
        let conflict = UniquenessGuard::check_conflicts(
            &mut RepositoryLookup(repo),
            &details.tax_id,
            &details.email,
            None,
        )
        .await?;
        if let Some(conflict) = conflict {
            return Err(ClientRegistryError::Duplicate(conflict));
        }

        // Step 4: Insert; the store assigns identity and timestamps.
        Ok(repo.insert(&details).await?)
    }

    pub async fn update(
        &self,
        id: ClientId,
        payload: &ClientPayload,
    ) -> Result<Client, ClientRegistryError> {
        if self.repos.supports_tx() {
            let repo = self.repos.client.clone();
            let payload = payload.clone();
            return self
                .repos
                .with_tx(move |tx| Box::pin(Self::update_in_tx(repo, tx, id, payload)))
                .await;
        }

        let repo = &self.repos.client;

        // Step 1: The record must exist.
        let mut client = repo.get(id).await?.ok_or(ClientRegistryError::NotFound(id))?;

        // Step 2: Validate every field.
        let details = validate_now(payload).map_err(ClientRegistryError::Validation)?;

        // Step 3: Reject values held by any other client.
        let conflict = UniquenessGuard::check_conflicts(
            &mut RepositoryLookup(repo),
            &details.tax_id,
            &details.email,
            Some(id),
        )
        .await?;
        if let Some(conflict) = conflict {
            return Err(ClientRegistryError::Duplicate(conflict));
        }

        // Step 4: Replace mutable fields and persist.
        client.apply_update(details, Timestamp::now_utc());
        repo.update(&client).await.map_err(not_found_as(id))
    }

    /// Permanently remove a client. Deleting an unknown or already deleted
    /// id reports `NotFound`.
    pub async fn delete(&self, id: ClientId) -> Result<(), ClientRegistryError> {
        self.repos.client.delete(id).await.map_err(not_found_as(id))
    }

    async fn create_in_tx(
        repo: Arc<ClientRepository>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        details: ClientDetails,
    ) -> Result<Client, ClientRegistryError> {
        // Step 1: Hold writers of the same tax ID or email until commit.
        repo.lock_unique_keys_tx(&mut *tx, &details.tax_id, &details.email)
            .await?;

        // Step 2: Check uniqueness on the locked transaction.
        let conflict = {
            let mut lookup = TxLookup {
                repo: &repo,
                tx: &mut *tx,
            };
            UniquenessGuard::check_conflicts(&mut lookup, &details.tax_id, &details.email, None)
                .await?
        };
        if let Some(conflict) = conflict {
            return Err(ClientRegistryError::Duplicate(conflict));
        }

        // Step 3: Insert inside the same transaction.
        Ok(repo.insert_tx(&mut *tx, &details).await?)
    }

    async fn update_in_tx(
        repo: Arc<ClientRepository>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: ClientId,
        payload: ClientPayload,
    ) -> Result<Client, ClientRegistryError> {
        // Step 1: The record must exist.
        let mut client = repo
            .get_tx(&mut *tx, id)
            .await?
            .ok_or(ClientRegistryError::NotFound(id))?;

        // Step 2: Validate every field.
        let details = validate_now(&payload).map_err(ClientRegistryError::Validation)?;

        // Step 3: Lock the candidate values, then check them.
        repo.lock_unique_keys_tx(&mut *tx, &details.tax_id, &details.email)
            .await?;
        let conflict = {
            let mut lookup = TxLookup {
                repo: &repo,
                tx: &mut *tx,
            };
            UniquenessGuard::check_conflicts(&mut lookup, &details.tax_id, &details.email, Some(id))
                .await?
        };
        if let Some(conflict) = conflict {
            return Err(ClientRegistryError::Duplicate(conflict));
        }

        // Step 4: Replace mutable fields and persist.
        client.apply_update(details, Timestamp::now_utc());
        repo.update_tx(&mut *tx, &client)
            .await
            .map_err(not_found_as(id))
    }
}

#[cfg(test)]
mod tests {
    use super::ClientRegistryError;
    use crate::application::context::test_support::{failing_context, test_context};
    use crate::application::shared::uniqueness_guard::Conflict;
    use crate::domain::entities::client::test_support::juan_perez;
    use crate::domain::entities::client::ClientPayload;
    use crate::domain::services::client_validation::TAX_ID;
    use crate::domain::value_objects::ids::ClientId;

    fn other_client() -> ClientPayload {
        let mut payload = juan_perez();
        payload.first_name = Some("Maria".to_string());
        payload.last_name = Some("Gomez".to_string());
        payload.company_name = Some("MG Consultora SA".to_string());
        payload.tax_id = Some("27-87654321-3".to_string());
        payload.email = Some("maria.gomez@example.com".to_string());
        payload
    }

    #[tokio::test]
    async fn given_valid_payload_when_create_should_store_and_return_client() {
        let ctx = test_context();

        let created = ctx.registry.create(&juan_perez()).await.unwrap();
        let fetched = ctx.registry.find_by_id(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(created.details.tax_id, "20-12345678-9");
        assert!(created.created_at <= created.updated_at);
    }

    #[tokio::test]
    async fn given_invalid_tax_id_when_create_should_fail_validation_and_store_nothing() {
        let ctx = test_context();
        let mut payload = juan_perez();
        payload.tax_id = Some("invalid".to_string());

        let err = ctx.registry.create(&payload).await.unwrap_err();

        match err {
            ClientRegistryError::Validation(violations) => assert!(violations.contains(TAX_ID)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ctx.registry.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn given_taken_tax_id_when_create_should_report_tax_id_conflict() {
        let ctx = test_context();
        ctx.registry.create(&juan_perez()).await.unwrap();
        let mut payload = other_client();
        payload.tax_id = Some("20-12345678-9".to_string());

        let err = ctx.registry.create(&payload).await.unwrap_err();

        assert!(matches!(
            err,
            ClientRegistryError::Duplicate(Conflict::TaxId(ref v)) if v == "20-12345678-9"
        ));
    }

    #[tokio::test]
    async fn given_taken_email_when_create_should_report_email_conflict() {
        let ctx = test_context();
        ctx.registry.create(&juan_perez()).await.unwrap();
        let mut payload = other_client();
        payload.email = Some("juan.perez@example.com".to_string());

        let err = ctx.registry.create(&payload).await.unwrap_err();

        assert!(matches!(err, ClientRegistryError::Duplicate(Conflict::Email(_))));
    }

    #[tokio::test]
    async fn given_missing_id_when_update_should_return_not_found_before_validation() {
        let ctx = test_context();

        let err = ctx
            .registry
            .update(ClientId(99), &ClientPayload::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientRegistryError::NotFound(ClientId(99))));
    }

    #[tokio::test]
    async fn given_unchanged_payload_when_update_should_not_conflict_with_itself() {
        let ctx = test_context();
        let created = ctx.registry.create(&juan_perez()).await.unwrap();

        let updated = ctx.registry.update(created.id, &juan_perez()).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn given_new_values_when_update_should_replace_mutable_fields() {
        let ctx = test_context();
        let created = ctx.registry.create(&juan_perez()).await.unwrap();
        let mut payload = juan_perez();
        payload.first_name = Some("Juan Carlos".to_string());
        payload.phone_number = Some("1165874999".to_string());

        let updated = ctx.registry.update(created.id, &payload).await.unwrap();

        assert_eq!(updated.details.first_name, "Juan Carlos");
        assert_eq!(updated.details.phone_number, "1165874999");
        assert_eq!(ctx.registry.find_by_id(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn given_invalid_payload_when_update_should_fail_validation_and_keep_record() {
        let ctx = test_context();
        let created = ctx.registry.create(&juan_perez()).await.unwrap();
        let mut payload = juan_perez();
        payload.email = Some("not-an-email".to_string());

        let err = ctx.registry.update(created.id, &payload).await.unwrap_err();

        assert!(matches!(err, ClientRegistryError::Validation(_)));
        assert_eq!(ctx.registry.find_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn given_existing_client_when_deleted_twice_should_report_not_found_second_time() {
        let ctx = test_context();
        let created = ctx.registry.create(&juan_perez()).await.unwrap();

        ctx.registry.delete(created.id).await.unwrap();
        let second = ctx.registry.delete(created.id).await.unwrap_err();
        let lookup = ctx.registry.find_by_id(created.id).await.unwrap_err();

        assert!(matches!(second, ClientRegistryError::NotFound(_)));
        assert!(matches!(lookup, ClientRegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn given_mixed_case_fragments_when_search_should_return_same_clients() {
        let ctx = test_context();
        ctx.registry.create(&juan_perez()).await.unwrap();
        ctx.registry.create(&other_client()).await.unwrap();

        let lower = ctx.registry.search_by_name("juan").await.unwrap();
        let upper = ctx.registry.search_by_name("JUAN").await.unwrap();

        assert_eq!(lower.len(), 1);
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn given_empty_fragment_when_search_should_return_every_client() {
        let ctx = test_context();
        ctx.registry.create(&juan_perez()).await.unwrap();
        ctx.registry.create(&other_client()).await.unwrap();

        let all = ctx.registry.search_by_name("").await.unwrap();

        assert_eq!(all, ctx.registry.find_all().await.unwrap());
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn given_unreachable_store_when_operating_should_return_storage_error() {
        let ctx = failing_context();

        let listed = ctx.registry.find_all().await.unwrap_err();
        let created = ctx.registry.create(&juan_perez()).await.unwrap_err();
        let deleted = ctx.registry.delete(ClientId(1)).await.unwrap_err();

        assert!(matches!(listed, ClientRegistryError::Storage(_)));
        assert!(matches!(created, ClientRegistryError::Storage(_)));
        assert!(matches!(deleted, ClientRegistryError::Storage(_)));
    }
}
