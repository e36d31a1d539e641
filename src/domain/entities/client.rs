use crate::domain::value_objects::ids::ClientId;
use crate::domain::value_objects::timestamps::Timestamp;
use time::Date;

/// A client submission as received from the caller. Every field is optional
/// so that missing values surface as validation violations rather than
/// deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub birth_date: Option<Date>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// The replaceable part of a client record, only produced by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDetails {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub tax_id: String,
    pub birth_date: Date,
    pub phone_number: String,
    pub email: String,
}

/// A persisted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub details: ClientDetails,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Client {
    /// Replace every mutable field and refresh the modification timestamp.
    /// Identity and creation timestamp are left untouched.
    pub fn apply_update(&mut self, details: ClientDetails, now: Timestamp) {
        self.details = details;
        self.updated_at = now.not_before(self.updated_at);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{ClientDetails, ClientPayload};
    use time::macros::date;

    pub fn juan_perez() -> ClientPayload {
        ClientPayload {
            first_name: Some("Juan".to_string()),
            last_name: Some("Perez".to_string()),
            company_name: Some("JP Servicios SRL".to_string()),
            tax_id: Some("20-12345678-9".to_string()),
            birth_date: Some(date!(1985 - 06 - 15)),
            phone_number: Some("1165874210".to_string()),
            email: Some("juan.perez@example.com".to_string()),
        }
    }

    pub fn juan_perez_details() -> ClientDetails {
        ClientDetails {
            first_name: "Juan".to_string(),
            last_name: "Perez".to_string(),
            company_name: "JP Servicios SRL".to_string(),
            tax_id: "20-12345678-9".to_string(),
            birth_date: date!(1985 - 06 - 15),
            phone_number: "1165874210".to_string(),
            email: "juan.perez@example.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::juan_perez_details;
    use super::Client;
    use crate::domain::value_objects::ids::ClientId;
    use crate::domain::value_objects::timestamps::Timestamp;
    use time::Duration;

    fn sample_client() -> Client {
        let now = Timestamp::now_utc();
        Client {
            id: ClientId(1),
            details: juan_perez_details(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn given_new_details_when_apply_update_should_keep_identity_and_creation() {
        let mut client = sample_client();
        let before = client.clone();
        let mut details = juan_perez_details();
        details.first_name = "Juan Carlos".to_string();

        client.apply_update(details, Timestamp::now_utc());

        assert_eq!(client.id, before.id);
        assert_eq!(client.created_at, before.created_at);
        assert_eq!(client.details.first_name, "Juan Carlos");
        assert!(client.updated_at >= before.updated_at);
    }

    #[test]
    fn given_clock_behind_when_apply_update_should_not_move_updated_at_back() {
        let mut client = sample_client();
        let before = client.updated_at;
        let skewed = Timestamp::from(before.as_inner() - Duration::minutes(1));

        client.apply_update(juan_perez_details(), skewed);

        assert_eq!(client.updated_at, before);
    }
}
