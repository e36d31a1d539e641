// HTTP routes: client CRUD and name search.

use crate::application::client_registry::ClientRegistryError;
use crate::domain::entities::client::{Client, ClientPayload};
use crate::domain::value_objects::ids::ClientId;
use crate::interface::http::dto::client::{ClientRequest, ClientResponse, SearchQuery};
use crate::interface::http::problem::{
    CLIENT_DUPLICATE, CLIENT_NOT_FOUND, CLIENT_REQUEST_MALFORMED, CLIENT_STORAGE_ERROR, problem,
    validation_problem,
};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::BTreeMap;
use tracing::{info, warn};

const BASE_PATH: &str = "/api/clients";

/// Builds the client routes.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(BASE_PATH, get(list_clients).post(create_client))
        .route("/api/clients/search", get(search_clients))
        .route(
            "/api/clients/:client_id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// Lists every client.
async fn list_clients(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
) -> Response {
    let trace_id = Some(trace_id.0);
    match state.ctx.registry.find_all().await {
        Ok(clients) => Json(to_responses(clients)).into_response(),
        Err(err) => registry_problem(err, BASE_PATH.to_string(), trace_id),
    }
}

/// Fetches one client by id.
async fn get_client(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    Path(client_id): Path<String>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let instance = format!("{BASE_PATH}/{client_id}");

    // Step 1: Parse the client id.
    let Ok(client_id) = client_id.parse::<ClientId>() else {
        return malformed("invalid client id", instance, trace_id);
    };

    // Step 2: Look it up.
    match state.ctx.registry.find_by_id(client_id).await {
        Ok(client) => Json(ClientResponse::from(client)).into_response(),
        Err(err) => registry_problem(err, instance, trace_id),
    }
}

/// Case-insensitive search over first, last and company name.
async fn search_clients(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let instance = format!("{BASE_PATH}/search");

    // Step 1: The `name` parameter is mandatory, though it may be empty.
    let Ok(Query(query)) = query else {
        return malformed("query parameter 'name' is required", instance, trace_id);
    };

    // Step 2: Run the search.
    match state.ctx.registry.search_by_name(&query.name).await {
        Ok(clients) => Json(to_responses(clients)).into_response(),
        Err(err) => registry_problem(err, instance, trace_id),
    }
}

/// Creates a client and returns the stored record.
async fn create_client(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    body: Result<Json<ClientRequest>, JsonRejection>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let instance = BASE_PATH.to_string();

    // Step 1: Decode the body.
    let payload = match body {
        Ok(Json(req)) => ClientPayload::from(req),
        Err(rejection) => return malformed(&rejection.body_text(), instance, trace_id),
    };

    // Step 2: Run the registry operation.
    match state.ctx.registry.create(&payload).await {
        Ok(client) => {
            info!(client_id = %client.id, "client_created");
            (StatusCode::CREATED, Json(ClientResponse::from(client))).into_response()
        }
        Err(err) => registry_problem(err, instance, trace_id),
    }
}

/// Replaces every mutable field of a client.
async fn update_client(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    Path(client_id): Path<String>,
    body: Result<Json<ClientRequest>, JsonRejection>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let instance = format!("{BASE_PATH}/{client_id}");

    // Step 1: Parse the client id.
    let Ok(client_id) = client_id.parse::<ClientId>() else {
        return malformed("invalid client id", instance, trace_id);
    };

    // Step 2: Decode the body.
    let payload = match body {
        Ok(Json(req)) => ClientPayload::from(req),
        Err(rejection) => return malformed(&rejection.body_text(), instance, trace_id),
    };

    // Step 3: Run the registry operation.
    match state.ctx.registry.update(client_id, &payload).await {
        Ok(client) => {
            info!(client_id = %client.id, "client_updated");
            Json(ClientResponse::from(client)).into_response()
        }
        Err(err) => registry_problem(err, instance, trace_id),
    }
}

/// Permanently removes a client.
async fn delete_client(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    Path(client_id): Path<String>,
) -> Response {
    let trace_id = Some(trace_id.0);
    let instance = format!("{BASE_PATH}/{client_id}");

    let Ok(client_id) = client_id.parse::<ClientId>() else {
        return malformed("invalid client id", instance, trace_id);
    };

    match state.ctx.registry.delete(client_id).await {
        Ok(()) => {
            info!(client_id = %client_id, "client_deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => registry_problem(err, instance, trace_id),
    }
}

fn to_responses(clients: Vec<Client>) -> Vec<ClientResponse> {
    clients.into_iter().map(ClientResponse::from).collect()
}

fn malformed(detail: &str, instance: String, trace_id: Option<String>) -> Response {
    problem(
        StatusCode::BAD_REQUEST,
        CLIENT_REQUEST_MALFORMED,
        Some(detail.to_string()),
        Some(instance),
        trace_id,
    )
}

/// Maps a registry failure to its problem response.
fn registry_problem(err: ClientRegistryError, instance: String, trace_id: Option<String>) -> Response {
    match err {
        ClientRegistryError::Validation(violations) => {
            info!(fields = violations.len(), "client_validation_rejected");
            let errors: BTreeMap<String, Vec<String>> = violations
                .iter()
                .map(|(field, messages)| (field.to_string(), messages.to_vec()))
                .collect();
            validation_problem(errors, Some(instance), trace_id)
        }
        ClientRegistryError::Duplicate(conflict) => {
            info!(
                field = conflict.field(),
                value = conflict.value(),
                "client_duplicate_rejected"
            );
            problem(
                StatusCode::CONFLICT,
                CLIENT_DUPLICATE,
                Some(conflict.to_string()),
                Some(instance),
                trace_id,
            )
        }
        err @ ClientRegistryError::NotFound(_) => problem(
            StatusCode::NOT_FOUND,
            CLIENT_NOT_FOUND,
            Some(err.to_string()),
            Some(instance),
            trace_id,
        ),
        ClientRegistryError::Storage(reason) => {
            warn!(
                trace_id = trace_id.as_deref().unwrap_or(""),
                reason = %reason,
                "client_storage_failure"
            );
            problem(
                StatusCode::SERVICE_UNAVAILABLE,
                CLIENT_STORAGE_ERROR,
                Some("storage unavailable".to_string()),
                Some(instance),
                trace_id,
            )
        }
    }
}
