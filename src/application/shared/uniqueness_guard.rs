// Pre-write detection of tax ID and email collisions.

use crate::domain::entities::client::Client;
use crate::domain::services::client_validation::{EMAIL, TAX_ID};
use crate::domain::value_objects::ids::ClientId;
use crate::infrastructure::db::repositories::client_repository::ClientRepository;
use crate::infrastructure::db::stores::client_store::ClientRepositoryError;
use async_trait::async_trait;
use std::fmt;

/// Lookups the guard needs, either straight against the store or inside an
/// open transaction.
#[async_trait]
pub trait ClientLookup: Send {
    async fn find_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>, ClientRepositoryError>;
    async fn find_by_email(&mut self, email: &str) -> Result<Option<Client>, ClientRepositoryError>;
}

/// Lookups issued directly against the repository, one round trip each.
pub struct RepositoryLookup<'a>(pub &'a ClientRepository);

#[async_trait]
impl<'a> ClientLookup for RepositoryLookup<'a> {
    async fn find_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>, ClientRepositoryError> {
        self.0.get_by_tax_id(tax_id).await
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<Client>, ClientRepositoryError> {
        self.0.get_by_email(email).await
    }
}

/// Lookups issued on an open transaction.
pub struct TxLookup<'a, 't> {
    pub repo: &'a ClientRepository,
    pub tx: &'a mut sqlx::Transaction<'t, sqlx::Postgres>,
}

#[async_trait]
impl<'a, 't> ClientLookup for TxLookup<'a, 't> {
    async fn find_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>, ClientRepositoryError> {
        self.repo.get_by_tax_id_tx(&mut *self.tx, tax_id).await
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<Client>, ClientRepositoryError> {
        self.repo.get_by_email_tx(&mut *self.tx, email).await
    }
}

/// A uniqueness collision found before writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    TaxId(String),
    Email(String),
}

impl Conflict {
    /// Wire name of the colliding field.
    pub fn field(&self) -> &'static str {
        match self {
            Conflict::TaxId(_) => TAX_ID,
            Conflict::Email(_) => EMAIL,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Conflict::TaxId(v) | Conflict::Email(v) => v,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::TaxId(v) => write!(f, "A client with tax ID {v} already exists"),
            Conflict::Email(v) => write!(f, "A client with email {v} already exists"),
        }
    }
}

/// Reports the first record, other than `exclude`, that already holds the
/// candidate tax ID or email.
///
/// The tax ID is checked first and a hit there short-circuits, so when both
/// values collide the tax ID conflict wins. This is advisory: without a
/// transaction another writer can claim the same value between this check
/// and the write, and only the store's own constraint catches that.
pub struct UniquenessGuard;

impl UniquenessGuard {
    pub async fn check_conflicts<L>(
        lookup: &mut L,
        tax_id: &str,
        email: &str,
        exclude: Option<ClientId>,
    ) -> Result<Option<Conflict>, ClientRepositoryError>
    where
        L: ClientLookup + ?Sized,
    {
        let is_other = |client: &Client| Some(client.id) != exclude;

        // Step 1: Tax ID first; a hit here is final.
        if let Some(holder) = lookup.find_by_tax_id(tax_id).await? {
            if is_other(&holder) {
                return Ok(Some(Conflict::TaxId(tax_id.to_string())));
            }
        }

        // Step 2: Email, under the same exclusion.
        if let Some(holder) = lookup.find_by_email(email).await? {
            if is_other(&holder) {
                return Ok(Some(Conflict::Email(email.to_string())));
            }
        }

        Ok(None)
    }
}
