//! Axum router construction and Swift route mapping.
//!
//! The [`app`] function wires the auth endpoint, the storage namespace and the
//! operational endpoints to their handlers and returns a ready-to-serve
//! [`axum::Router`].
//!
//! Swift distinguishes resources by path depth rather than by route, and uses
//! the non-standard `COPY` verb, so every storage request lands in a single
//! handler that authenticates, resolves the path to a resource and dispatches
//! on the method.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::auth::{self, ExchangeRequest};
use crate::errors::{generate_request_id, SwiftError};
use crate::handlers::{dispatch, Context, Reply, SwiftRequest};
use crate::metrics::{metrics_handler, metrics_middleware, record_operation};
use crate::resolver;
use crate::AppState;

/// Build the axum [`Router`] with all Swift routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let observability = &state.config.observability;
    let mut router = Router::new()
        // Credential exchange, under both historical paths.
        .route("/auth/v1.0", any(handle_auth))
        .route("/v1.0", any(handle_auth))
        .route("/info", get(handle_info))
        // Storage namespace; the resolver validates the rest of the path.
        .route("/v1/*path", any(handle_storage))
        .route("/auth/v1/*path", any(handle_storage));

    if observability.health_check {
        router = router.route("/health", get(health_check));
    }
    if observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .fallback(handle_unknown)
        // Application state shared across all handlers.
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        // common_headers_middleware adds X-Trans-Id and Date.
        .layer(middleware::from_fn(common_headers_middleware))
        // metrics_middleware captures the full request lifecycle.
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        // Object bodies are bounded by `server.max_object_size` instead.
        .layer(DefaultBodyLimit::disable())
}

// -- Common headers middleware -----------------------------------------------

/// Middleware that adds common Swift response headers to every response:
/// - `X-Trans-Id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // The error renderer sets its own id.
    if !headers.contains_key("x-trans-id") {
        if let Ok(id) = HeaderValue::from_str(&generate_request_id()) {
            headers.insert("x-trans-id", id);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(date) = HeaderValue::from_str(&date) {
        headers.insert("date", date);
    }

    response
}

// -- Operational endpoints ---------------------------------------------------

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /info` -- static capability document.
async fn handle_info() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "swift": { "version": "1.2" },
        "tempurl": { "methods": ["GET", "HEAD", "PUT"] },
    }))
}

async fn handle_unknown(uri: Uri) -> SwiftError {
    debug!("No route for {}", uri.path());
    SwiftError::InvalidUri
}

// -- Query parameter parsing helper ------------------------------------------

/// Parse raw query string into a HashMap. Keys and values are form-decoded,
/// so `+` reads as a space.
fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(qs) = raw {
        for part in qs.split('&') {
            if let Some((k, v)) = part.split_once('=') {
                map.insert(form_decode(k), form_decode(v));
            } else if !part.is_empty() {
                // Flags without a value (e.g. `?extract-archive`).
                map.insert(form_decode(part), String::new());
            }
        }
    }
    map
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

fn form_decode(s: &str) -> String {
    decode(&s.replace('+', " "))
}

// -- Credential exchange -----------------------------------------------------

/// `* /auth/v1.0` -- trade a username and key for a session token.
async fn handle_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Reply, SwiftError> {
    let request = ExchangeRequest::from_headers(&headers).ok_or(SwiftError::NotAuthorized)?;
    let issued = {
        let mut store = state.store.lock().await;
        auth::exchange_credentials(&mut store, &request)?
    };
    let storage_url = format!(
        "{}/v1/AUTH_{}",
        state.config.server.public_url(),
        issued.account
    );
    Ok(Reply::new(StatusCode::NO_CONTENT)
        .header("x-storage-url", storage_url)
        .header("x-auth-token", &issued.token)
        .header("x-storage-token", &issued.token))
}

// -- Storage dispatch --------------------------------------------------------

/// `* /v1/AUTH_<account>[/<container>[/<object>]]`
///
/// Authentication, resolution and the operation itself all run under the
/// store lock.
async fn handle_storage(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Reply, SwiftError> {
    let req = SwiftRequest {
        method,
        path: decode(uri.path()),
        query: parse_query(uri.query()),
        headers,
        body,
    };
    let address = resolver::parse_path(&req.path)?;

    let mut store = state.store.lock().await;

    let credential = auth::detect_credential(
        &req.headers,
        req.query.get("temp_url_sig").map(String::as_str),
        req.query.get("temp_url_expires").map(String::as_str),
    );
    auth::authorize(
        &store,
        &req.method,
        &req.path,
        &address.account,
        &credential,
    )?;

    let target = resolver::resolve(
        &store,
        &address,
        req.query.get("versionId").map(String::as_str),
    )?;
    let resource = target.resource();
    let mut ctx = Context {
        store: &mut *store,
        config: &state.config,
        req: &req,
    };
    let result = dispatch(resource, &mut ctx);

    let status = match &result {
        Ok(reply) => reply.status,
        Err(err) => err.status_code(),
    };
    record_operation(resource.kind(), req.method.as_str(), status);
    result
}

// -- Tests -------------------------------------------------------------------
