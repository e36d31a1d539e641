use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;

/// RFC 7807 Problem Details payload.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub r#type: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies this specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// A stable, machine-readable application error code (CLIENT_...).
    pub code: String,
    /// Request trace id, echoed from the `x-request-id` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Per-field validation messages, only present for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Build a Problem Details response with the correct content-type.
pub fn problem(
    status: StatusCode,
    code: &str,
    detail: Option<String>,
    instance: Option<String>,
    trace_id: Option<String>,
) -> Response {
    render(ProblemDetails {
        r#type: "about:blank".to_string(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        status: status.as_u16(),
        detail,
        instance,
        code: code.to_string(),
        trace_id,
        errors: None,
    })
}

/// Build a 400 validation problem carrying the per-field messages.
pub fn validation_problem(
    errors: BTreeMap<String, Vec<String>>,
    instance: Option<String>,
    trace_id: Option<String>,
) -> Response {
    let status = StatusCode::BAD_REQUEST;
    render(ProblemDetails {
        r#type: "about:blank".to_string(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        status: status.as_u16(),
        detail: Some("Validation failed".to_string()),
        instance,
        code: CLIENT_VALIDATION_FAILED.to_string(),
        trace_id,
        errors: Some(errors),
    })
}

fn render(payload: ProblemDetails) -> Response {
    let status = StatusCode::from_u16(payload.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Step 1: Convert to an HTTP response with JSON body.
    let mut response = (status, Json(payload)).into_response();

    // Step 2: Ensure RFC 7807 content type.
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );

    response
}

pub const CLIENT_REQUEST_MALFORMED: &str = "CLIENT_REQUEST_MALFORMED";
pub const CLIENT_VALIDATION_FAILED: &str = "CLIENT_VALIDATION_FAILED";
pub const CLIENT_NOT_FOUND: &str = "CLIENT_NOT_FOUND";
pub const CLIENT_DUPLICATE: &str = "CLIENT_DUPLICATE";
pub const CLIENT_STORAGE_ERROR: &str = "CLIENT_STORAGE_ERROR";

#[cfg(test)]
mod tests {
    use super::{CLIENT_NOT_FOUND, problem, validation_problem};
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::Value;
    use std::collections::BTreeMap;

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn given_not_found_when_rendered_should_use_problem_content_type_and_omit_errors() {
        let response = problem(
            StatusCode::NOT_FOUND,
            CLIENT_NOT_FOUND,
            Some("Client not found with id: 7".to_string()),
            Some("/api/clients/7".to_string()),
            Some("trace-1".to_string()),
        );

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
        let json = body_json(response).await;
        assert_eq!(json["title"], "Not Found");
        assert_eq!(json["code"], "CLIENT_NOT_FOUND");
        assert_eq!(json["trace_id"], "trace-1");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn given_field_messages_when_validation_problem_should_include_errors_map() {
        let mut errors = BTreeMap::new();
        errors.insert("taxId".to_string(), vec!["Invalid tax ID format".to_string()]);

        let json = body_json(validation_problem(errors, None, None)).await;

        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "CLIENT_VALIDATION_FAILED");
        assert_eq!(json["errors"]["taxId"][0], "Invalid tax ID format");
    }
}
