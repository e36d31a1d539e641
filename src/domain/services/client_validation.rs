// Field-level validation of client submissions.

use crate::domain::entities::client::{ClientDetails, ClientPayload};
use crate::domain::value_objects::timestamps::today_utc;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use time::Date;

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const COMPANY_NAME: &str = "companyName";
pub const TAX_ID: &str = "taxId";
pub const BIRTH_DATE: &str = "birthDate";
pub const PHONE_NUMBER: &str = "phoneNumber";
pub const EMAIL: &str = "email";

const MAX_NAME_LEN: usize = 100;
const MAX_COMPANY_NAME_LEN: usize = 150;
const MAX_PHONE_LEN: usize = 30;
const MAX_EMAIL_LEN: usize = 150;

fn tax_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}-[0-9]{8}-[0-9]$").expect("valid tax id regex"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        )
        .expect("valid email regex")
    })
}

/// Every violated field with its messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldViolations(BTreeMap<&'static str, Vec<String>>);

impl FieldViolations {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[cfg(test)]
    pub(crate) fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.0.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }
}

impl fmt::Display for FieldViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Validate a submission against the current UTC date.
pub fn validate_now(payload: &ClientPayload) -> Result<ClientDetails, FieldViolations> {
    validate(payload, today_utc())
}

/// Check every field of `payload` and return the typed details, or all
/// violations found. `today` is the first date a birth date may not reach.
pub fn validate(payload: &ClientPayload, today: Date) -> Result<ClientDetails, FieldViolations> {
    let mut violations = FieldViolations::default();

    let first_name = required_text(
        &mut violations,
        FIRST_NAME,
        payload.first_name.as_deref(),
        "First name is required",
    );
    if let Some(value) = first_name {
        max_len(&mut violations, FIRST_NAME, value, MAX_NAME_LEN, "First name must not exceed 100 characters");
    }

    let last_name = required_text(
        &mut violations,
        LAST_NAME,
        payload.last_name.as_deref(),
        "Last name is required",
    );
    if let Some(value) = last_name {
        max_len(&mut violations, LAST_NAME, value, MAX_NAME_LEN, "Last name must not exceed 100 characters");
    }

    let company_name = required_text(
        &mut violations,
        COMPANY_NAME,
        payload.company_name.as_deref(),
        "Company name is required",
    );
    if let Some(value) = company_name {
        max_len(
            &mut violations,
            COMPANY_NAME,
            value,
            MAX_COMPANY_NAME_LEN,
            "Company name must not exceed 150 characters",
        );
    }

    let tax_id = required_text(
        &mut violations,
        TAX_ID,
        payload.tax_id.as_deref(),
        "Tax ID (CUIT) is required",
    );
    if let Some(value) = tax_id {
        if !tax_id_pattern().is_match(value) {
            violations.add(TAX_ID, "Tax ID must follow the format XX-XXXXXXXX-X");
        }
    }

    match payload.birth_date {
        None => violations.add(BIRTH_DATE, "Birth date is required"),
        Some(date) if date >= today => violations.add(BIRTH_DATE, "Birth date must be in the past"),
        Some(_) => {}
    }

    let phone_number = required_text(
        &mut violations,
        PHONE_NUMBER,
        payload.phone_number.as_deref(),
        "Phone number is required",
    );
    if let Some(value) = phone_number {
        max_len(
            &mut violations,
            PHONE_NUMBER,
            value,
            MAX_PHONE_LEN,
            "Phone number must not exceed 30 characters",
        );
    }

    let email = required_text(&mut violations, EMAIL, payload.email.as_deref(), "Email is required");
    if let Some(value) = email {
        if !email_pattern().is_match(value) {
            violations.add(EMAIL, "Email must be valid");
        }
        max_len(&mut violations, EMAIL, value, MAX_EMAIL_LEN, "Email must not exceed 150 characters");
    }

    match (first_name, last_name, company_name, tax_id, payload.birth_date, phone_number, email) {
        (
            Some(first_name),
            Some(last_name),
            Some(company_name),
            Some(tax_id),
            Some(birth_date),
            Some(phone_number),
            Some(email),
        ) if violations.is_empty() => Ok(ClientDetails {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            company_name: company_name.to_string(),
            tax_id: tax_id.to_string(),
            birth_date,
            phone_number: phone_number.to_string(),
            email: email.to_string(),
        }),
        _ => Err(violations),
    }
}

/// Records `message` when the value is missing or blank; otherwise hands the
/// value back for the remaining rules.
fn required_text<'a>(
    violations: &mut FieldViolations,
    field: &'static str,
    value: Option<&'a str>,
    message: &str,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            violations.add(field, message);
            None
        }
    }
}

fn max_len(violations: &mut FieldViolations, field: &'static str, value: &str, max: usize, message: &str) {
    if value.chars().count() > max {
        violations.add(field, message);
    }
}
