//! Per-resource operation tables.
//!
//! Each resource kind (account root, container, object) implements
//! [`Resource`]. Verbs a kind does not support fall through to the default
//! implementations, which fail with `MethodNotAllowed`.

pub mod account;
pub mod container;
pub mod object;

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;

use crate::config::Config;
use crate::errors::SwiftError;
use crate::store::{Account, Store};

/// A decoded storage request.
#[derive(Debug, Clone)]
pub struct SwiftRequest {
    pub method: Method,
    /// Percent-decoded request path.
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl SwiftRequest {
    /// Query parameter value, empty when absent.
    pub fn param(&self, name: &str) -> &str {
        self.query.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Whether a structured (JSON) listing was asked for.
    pub fn wants_json(&self) -> bool {
        self.param("format") == "json"
            || self
                .header("content-type")
                .is_some_and(|ct| ct.starts_with("application/json"))
    }
}

/// A successful operation outcome, rendered at the request boundary.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
            self.headers.insert(HeaderName::from_static(name), value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, SwiftError> {
        let body = serde_json::to_vec(value).map_err(anyhow::Error::from)?;
        Ok(self
            .header("content-type", "application/json; charset=utf-8")
            .body(body))
    }

    /// One name per line.
    pub fn lines<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut body = String::new();
        for name in names {
            body.push_str(name);
            body.push('\n');
        }
        self.header("content-type", "text/plain; charset=utf-8")
            .body(body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Everything an operation may touch.
pub struct Context<'a> {
    pub store: &'a mut Store,
    pub config: &'a Config,
    pub req: &'a SwiftRequest,
}

impl Context<'_> {
    /// The account addressed by the request.
    pub fn account(&self, name: &str) -> Result<&Account, SwiftError> {
        self.store.account(name).ok_or(SwiftError::NoSuchAccount)
    }

    pub fn account_mut(&mut self, name: &str) -> Result<&mut Account, SwiftError> {
        self.store.account_mut(name).ok_or(SwiftError::NoSuchAccount)
    }
}

/// The subject of a storage request. It may or may not exist yet.
pub trait Resource {
    /// Resource kind label used in logs and metrics.
    fn kind(&self) -> &'static str;

    fn get(&self, _ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        Err(SwiftError::MethodNotAllowed)
    }

    fn put(&self, _ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        Err(SwiftError::MethodNotAllowed)
    }

    fn post(&self, _ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        Err(SwiftError::MethodNotAllowed)
    }

    fn delete(&self, _ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        Err(SwiftError::MethodNotAllowed)
    }

    fn copy(&self, _ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        Err(SwiftError::MethodNotAllowed)
    }
}

/// Route the request verb to the matching operation of `resource`.
pub fn dispatch(resource: &dyn Resource, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
    match ctx.req.method.as_str() {
        "GET" | "HEAD" => resource.get(ctx),
        "PUT" => resource.put(ctx),
        "POST" => resource.post(ctx),
        "DELETE" => resource.delete(ctx),
        "COPY" => resource.copy(ctx),
        _ => Err(SwiftError::MethodNotAllowed),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    struct Inert;

    impl Resource for Inert {
        fn kind(&self) -> &'static str {
            "inert"
        }
    }

    #[test]
    fn test_default_operations_not_allowed() {
        let mut store = store();
        let config = Config::default();
        for method in ["GET", "PUT", "POST", "DELETE", "COPY", "PATCH"] {
            let req = request(method, "/v1/AUTH_tera", &[], b"");
            let mut ctx = Context {
                store: &mut store,
                config: &config,
                req: &req,
            };
            assert!(matches!(
                dispatch(&Inert, &mut ctx),
                Err(SwiftError::MethodNotAllowed)
            ));
        }
    }

    #[test]
    fn test_wants_json() {
        assert!(request("GET", "/v1/AUTH_tera?format=json", &[], b"").wants_json());
        assert!(request(
            "GET",
            "/v1/AUTH_tera",
            &[("content-type", "application/json")],
            b""
        )
        .wants_json());
        assert!(!request("GET", "/v1/AUTH_tera", &[], b"").wants_json());
    }

    #[test]
    fn test_reply_lines() {
        let reply = Reply::new(StatusCode::OK).lines(["a", "b/"]);
        assert_eq!(&reply.body[..], b"a\nb/\n");
    }
}
