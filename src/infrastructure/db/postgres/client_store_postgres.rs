use crate::infrastructure::db::dto::{ClientRow, NewClientRow};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::client_store::{ClientRepositoryError, ClientStore};
use async_trait::async_trait;
use sqlx::PgConnection;

const CLIENT_COLUMNS: &str = "id,
                first_name,
                last_name,
                company_name,
                tax_id,
                birth_date,
                phone_number,
                email,
                created_at,
                updated_at";

#[derive(Clone)]
pub struct ClientStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

/// Unique violations are the storage backstop for tax ID and email; every
/// other failure is opaque to callers.
fn map_sqlx_error(e: sqlx::Error) -> ClientRepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ClientRepositoryError::Conflict
        }
        _ => ClientRepositoryError::StorageUnavailable,
    }
}

/// Wrap `fragment` for `ILIKE`, escaping its own wildcards so it matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

impl ClientStorePostgres {
    /// Build a Postgres-backed client store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        client_id: i64,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(client_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)
    }

    async fn get_by_column_impl_conn(
        conn: &mut PgConnection,
        column: &'static str,
        value: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_impl_conn(conn: &mut PgConnection) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)
    }

    async fn search_by_name_impl_conn(
        conn: &mut PgConnection,
        fragment: &str,
    ) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE first_name ILIKE $1 ESCAPE '\\'
                OR last_name ILIKE $1 ESCAPE '\\'
                OR company_name ILIKE $1 ESCAPE '\\'
            ORDER BY id"
        ))
        .bind(like_pattern(fragment))
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &NewClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        sqlx::query_as::<_, ClientRow>(&format!(
            "INSERT INTO clients (
                first_name,
                last_name,
                company_name,
                tax_id,
                birth_date,
                phone_number,
                email
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.company_name)
        .bind(&row.tax_id)
        .bind(row.birth_date)
        .bind(&row.phone_number)
        .bind(&row.email)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_impl_conn(
        conn: &mut PgConnection,
        row: &ClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        let stored = sqlx::query_as::<_, ClientRow>(&format!(
            "UPDATE clients SET
                first_name = $2,
                last_name = $3,
                company_name = $4,
                tax_id = $5,
                birth_date = $6,
                phone_number = $7,
                email = $8,
                updated_at = GREATEST($9, updated_at)
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(row.id)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.company_name)
        .bind(&row.tax_id)
        .bind(row.birth_date)
        .bind(&row.phone_number)
        .bind(&row.email)
        .bind(row.updated_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

        stored.ok_or(ClientRepositoryError::NotFound)
    }

    async fn delete_impl_conn(
        conn: &mut PgConnection,
        client_id: i64,
    ) -> Result<(), ClientRepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(client_id)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(ClientRepositoryError::NotFound);
        }

        Ok(())
    }

    async fn lock_unique_keys_impl_conn(
        conn: &mut PgConnection,
        tax_id: &str,
        email: &str,
    ) -> Result<(), ClientRepositoryError> {
        // Fixed acquisition order keeps concurrent writers from deadlocking.
        let mut keys = [format!("clients.tax_id:{tax_id}"), format!("clients.email:{email}")];
        keys.sort();
        for key in &keys {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(key)
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStore for ClientStorePostgres {
    async fn get(&self, client_id: i64) -> Result<Option<ClientRow>, ClientRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, client_id)))
            .await
    }

    async fn get_by_tax_id(&self, tax_id: &str) -> Result<Option<ClientRow>, ClientRepositoryError> {
        let tax_id = tax_id.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::get_by_column_impl_conn(conn, "tax_id", &tax_id).await })
            })
            .await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<ClientRow>, ClientRepositoryError> {
        let email = email.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::get_by_column_impl_conn(conn, "email", &email).await })
            })
            .await
    }

    async fn list(&self) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        self.db
            .with_conn(|conn| Box::pin(Self::list_impl_conn(conn)))
            .await
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<ClientRow>, ClientRepositoryError> {
        let fragment = fragment.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::search_by_name_impl_conn(conn, &fragment).await })
            })
            .await
    }

    async fn insert(&self, row: &NewClientRow) -> Result<ClientRow, ClientRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| Box::pin(async move { Self::insert_impl_conn(conn, &row).await }))
            .await
    }

    async fn update(&self, row: &ClientRow) -> Result<ClientRow, ClientRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| Box::pin(async move { Self::update_impl_conn(conn, &row).await }))
            .await
    }

    async fn delete(&self, client_id: i64) -> Result<(), ClientRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::delete_impl_conn(conn, client_id)))
            .await
    }

    async fn lock_unique_keys_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
        email: &str,
    ) -> Result<(), ClientRepositoryError> {
        Self::lock_unique_keys_impl_conn(&mut *tx, tax_id, email).await
    }

    async fn get_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        client_id: i64,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Self::get_impl_conn(&mut *tx, client_id).await
    }

    async fn get_by_tax_id_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tax_id: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Self::get_by_column_impl_conn(&mut *tx, "tax_id", tax_id).await
    }

    async fn get_by_email_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
    ) -> Result<Option<ClientRow>, ClientRepositoryError> {
        Self::get_by_column_impl_conn(&mut *tx, "email", email).await
    }

    async fn insert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        row: &NewClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        Self::insert_impl_conn(&mut *tx, row).await
    }

    async fn update_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        row: &ClientRow,
    ) -> Result<ClientRow, ClientRepositoryError> {
        Self::update_impl_conn(&mut *tx, row).await
    }
}
