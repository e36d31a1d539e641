use crate::domain::entities::client::{Client, ClientPayload};
use serde::{Deserialize, Serialize};
use time::Date;
use time::format_description::well_known::Rfc3339;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Body of create and update requests. Missing fields are reported by
/// validation, not by deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<Date>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl From<ClientRequest> for ClientPayload {
    fn from(req: ClientRequest) -> Self {
        ClientPayload {
            first_name: req.first_name,
            last_name: req.last_name,
            company_name: req.company_name,
            tax_id: req.tax_id,
            birth_date: req.birth_date,
            phone_number: req.phone_number,
            email: req.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub tax_id: String,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub phone_number: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        let details = client.details;
        ClientResponse {
            id: client.id.0,
            first_name: details.first_name,
            last_name: details.last_name,
            company_name: details.company_name,
            tax_id: details.tax_id,
            birth_date: details.birth_date,
            phone_number: details.phone_number,
            email: details.email,
            created_at: client.created_at.as_inner().format(&Rfc3339).unwrap_or_default(),
            updated_at: client.updated_at.as_inner().format(&Rfc3339).unwrap_or_default(),
        }
    }
}
