use crate::domain::entities::client::{Client, ClientDetails};
use crate::domain::value_objects::ids::ClientId;
use crate::domain::value_objects::timestamps::Timestamp;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub tax_id: String,
    pub birth_date: Date,
    pub phone_number: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Column values for an insert. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClientRow {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub tax_id: String,
    pub birth_date: Date,
    pub phone_number: String,
    pub email: String,
}

impl NewClientRow {
    pub fn from_details(details: &ClientDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            company_name: details.company_name.clone(),
            tax_id: details.tax_id.clone(),
            birth_date: details.birth_date,
            phone_number: details.phone_number.clone(),
            email: details.email.clone(),
        }
    }

    /// Materialize the row a store would hold after assigning `id` at `now`.
    pub fn into_row(self, id: i64, now: OffsetDateTime) -> ClientRow {
        ClientRow {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            company_name: self.company_name,
            tax_id: self.tax_id,
            birth_date: self.birth_date,
            phone_number: self.phone_number,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ClientRow {
    pub fn from_client(client: &Client) -> Self {
        let details = &client.details;
        Self {
            id: client.id.0,
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            company_name: details.company_name.clone(),
            tax_id: details.tax_id.clone(),
            birth_date: details.birth_date,
            phone_number: details.phone_number.clone(),
            email: details.email.clone(),
            created_at: client.created_at.as_inner(),
            updated_at: client.updated_at.as_inner(),
        }
    }

    pub fn into_client(self) -> Client {
        Client {
            id: ClientId(self.id),
            details: ClientDetails {
                first_name: self.first_name,
                last_name: self.last_name,
                company_name: self.company_name,
                tax_id: self.tax_id,
                birth_date: self.birth_date,
                phone_number: self.phone_number,
                email: self.email,
            },
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientRow, NewClientRow};
    use crate::domain::entities::client::test_support::juan_perez_details;
    use crate::domain::entities::client::Client;
    use crate::domain::value_objects::ids::ClientId;
    use crate::domain::value_objects::timestamps::Timestamp;
    use time::OffsetDateTime;

    #[test]
    fn given_client_when_from_client_should_map_fields() {
        let now = Timestamp::now_utc();
        let client = Client {
            id: ClientId(3),
            details: juan_perez_details(),
            created_at: now,
            updated_at: now,
        };

        let row = ClientRow::from_client(&client);

        assert_eq!(row.id, 3);
        assert_eq!(row.tax_id, "20-12345678-9");
        assert_eq!(row.email, "juan.perez@example.com");
        assert_eq!(row.created_at, now.as_inner());
        assert_eq!(row.clone().into_client(), client);
    }

    #[test]
    fn given_new_row_when_into_row_should_stamp_identity_and_both_timestamps() {
        let now = OffsetDateTime::now_utc();
        let new_row = NewClientRow::from_details(&juan_perez_details());

        let row = new_row.into_row(11, now);

        assert_eq!(row.id, 11);
        assert_eq!(row.created_at, now);
        assert_eq!(row.updated_at, now);
        assert_eq!(row.company_name, "JP Servicios SRL");
    }
}
