//! Prometheus metrics for swiftmock.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides an axum middleware for HTTP RED
//! metrics, and exposes the `/metrics` endpoint handler.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "swiftmock_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "swiftmock_http_request_duration_seconds";

/// Total dispatched storage operations (counter). Labels: resource, method, status.
pub const OPERATIONS_TOTAL: &str = "swiftmock_operations_total";

// -- Global recorder installation ---------------------------------------------

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent, so tests may
/// call it repeatedly. If another recorder is already installed the handle
/// still renders, just without samples.
pub fn init_metrics() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("A metrics recorder was already installed");
        }
        handle
    })
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        OPERATIONS_TOTAL,
        "Total storage operations by resource kind"
    );
}

/// Count one dispatched operation.
pub fn record_operation(resource: &'static str, method: &str, status: StatusCode) {
    counter!(
        OPERATIONS_TOTAL,
        "resource" => resource,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// `/metrics` itself is not instrumented.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Normalize an actual request path to a route template for metric labels,
/// keeping account, container and object names out of the label set.
///
/// Examples:
/// - `/info` -> `/info`
/// - `/v1/AUTH_tera` -> `/v1/{account}`
/// - `/auth/v1/AUTH_tera/photos` -> `/v1/{account}/{container}`
/// - `/v1/AUTH_tera/photos/2024/cat.jpg` -> `/v1/{account}/{container}/{object}`
/// - `/anything/else` -> `/{other}`
fn normalize_path(path: &str) -> String {
    match path {
        "/" | "/health" | "/info" | "/metrics" | "/v1.0" | "/auth/v1.0" => path.to_string(),
        _ => {
            let path = path.strip_prefix("/auth").unwrap_or(path);
            let Some(rest) = path.strip_prefix("/v1/") else {
                return "/{other}".to_string();
            };
            let segments = rest
                .trim_end_matches('/')
                .splitn(3, '/')
                .filter(|s| !s.is_empty())
                .count();
            match segments {
                0 => "/v1".to_string(),
                1 => "/v1/{account}".to_string(),
                2 => "/v1/{account}/{container}".to_string(),
                _ => "/v1/{account}/{container}/{object}".to_string(),
            }
        }
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
pub async fn metrics_handler() -> impl IntoResponse {
    let body = init_metrics().render();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
}

// -- Tests --------------------------------------------------------------------
