use axum::extract::MatchedPath;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use tracing::{info, warn};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// A per-request trace identifier used for support and debugging.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

impl TraceId {
    /// Reuse a non-blank caller-supplied id, otherwise mint a new one.
    fn from_request<B>(req: &Request<B>) -> Self {
        let supplied = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        match supplied {
            Some(id) => TraceId(id.to_string()),
            None => TraceId(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Attaches a `TraceId` to the request and echoes it in `x-request-id`.
pub async fn trace_id_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let trace_id = TraceId::from_request(&req);
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response.extensions_mut().insert(trace_id);
    response
}

/// Records request count and latency by route template, then logs the request.
pub async fn request_log_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    // Step 1: Capture labels before the request is consumed. The matched
    // template keeps client ids out of metric labels.
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .map(|t| t.0.clone())
        .unwrap_or_default();
    let start = std::time::Instant::now();

    // Step 2: Run the request.
    let response = next.run(req).await;

    // Step 3: Record metrics and emit the log line.
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let class = status_class(status);
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.clone(),
        "status" => class
    )
    .increment(1);
    histogram!(
        "http_request_duration_ms",
        "method" => method.to_string(),
        "route" => route
    )
    .record(latency_ms as f64);

    if response.status().is_server_error() {
        warn!(trace_id = %trace_id, method = %method, path = %path, status, latency_ms, "http_request");
    } else {
        info!(trace_id = %trace_id, method = %method, path = %path, status, latency_ms, "http_request");
    }

    response
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::{TraceId, status_class, trace_id_middleware};
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{Request, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use tower::util::ServiceExt;

    fn echo_app() -> Router {
        Router::new()
            .route("/echo", get(|Extension(id): Extension<TraceId>| async move { id.0 }))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    #[tokio::test]
    async fn given_request_id_header_when_handled_should_echo_same_id() {
        let response = echo_app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn given_blank_request_id_when_handled_should_generate_uuid() {
        let response = echo_app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header("x-request-id", "   ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn given_status_codes_when_classified_should_group_by_hundreds() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(503), "5xx");
    }
}
