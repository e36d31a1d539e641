use crate::interface::http::state::AppState;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    backend: &'static str,
}

/// Builds the readiness route.
pub fn router() -> Router<AppState> {
    Router::new().route("/ready", get(ready))
}

/// Ready once the store answers a trivial query. The in-memory store is
/// always ready.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let repos = &state.ctx.repos;
    let backend = if repos.supports_tx() { "postgres" } else { "memory" };
    match repos.execute("SELECT 1").await {
        Ok(_) => (StatusCode::OK, Json(ReadyResponse { status: "ready", backend })),
        Err(err) => {
            warn!(error = %err, "readiness_check_failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not_ready",
                    backend,
                }),
            )
        }
    }
}
