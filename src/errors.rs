//! Swift-compatible error types.
//!
//! Every variant maps to a status code and a short machine code.  The enum
//! implements [`axum::response::IntoResponse`] so the request boundary can
//! simply return `Err(SwiftError::NoSuchContainer)`; the message is rendered
//! as a plain-text body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Failures raised by the storage core.
#[derive(Debug, Error)]
pub enum SwiftError {
    /// The request path does not address an account.
    #[error("Couldn't parse the specified URI")]
    InvalidUri,

    /// The account named in the path does not exist.
    #[error("The specified account does not exist")]
    NoSuchAccount,

    /// The container named in the path does not exist.
    #[error("The specified container does not exist")]
    NoSuchContainer,

    /// The object named in the path does not exist.
    #[error("The resource could not be found.")]
    NoSuchObject,

    /// The object to delete or copy does not exist.
    #[error("The specified key does not exist.")]
    NoSuchKey,

    /// Container names are 1-256 bytes and may not contain `/`.
    #[error("The specified container is not valid")]
    InvalidContainerName,

    /// The supplied ETag is not a hex MD5 digest.
    #[error("The ETag you specified was invalid")]
    InvalidDigest,

    /// The body digest does not match the supplied ETag.
    #[error("The ETag you specified did not match what we received")]
    BadETag,

    /// Fewer (or more) bytes arrived than Content-Length announced.
    #[error("You did not provide the number of bytes specified by the Content-Length HTTP header")]
    IncompleteBody,

    /// The upload exceeds `server.max_object_size`.
    #[error("Your proposed upload exceeds the maximum allowed object size.")]
    EntityTooLarge,

    /// The Range header cannot be satisfied.
    #[error("The requested range is not satisfiable")]
    InvalidRange,

    /// The container you tried to delete is not empty.
    #[error("The container you tried to delete is not empty")]
    Conflict,

    /// Bad credentials, bad signature or unknown session.
    #[error("This server could not verify that you are authorized to access the document you requested.")]
    NotAuthorized,

    /// The verb is not supported on this kind of resource.
    #[error("The specified method is not allowed against this resource")]
    MethodNotAllowed,

    /// Explicitly unsupported operation (bulk upload / bulk delete).
    #[error("{message}")]
    Forbidden { message: String },

    /// Generic malformed request.
    #[error("{message}")]
    BadRequest { message: String },

    /// Catch-all for unexpected internal errors.
    #[error("We encountered an internal error, please try again.")]
    InternalError(#[from] anyhow::Error),
}

impl SwiftError {
    /// Return the short machine code.
    pub fn code(&self) -> &'static str {
        match self {
            SwiftError::InvalidUri => "InvalidURI",
            SwiftError::NoSuchAccount => "NoSuchAccount",
            SwiftError::NoSuchContainer => "NoSuchContainer",
            SwiftError::NoSuchObject => "Not Found",
            SwiftError::NoSuchKey => "NoSuchKey",
            SwiftError::InvalidContainerName => "InvalidContainerName",
            SwiftError::InvalidDigest => "InvalidDigest",
            SwiftError::BadETag => "Bad ETag",
            SwiftError::IncompleteBody => "IncompleteBody",
            SwiftError::EntityTooLarge => "EntityTooLarge",
            SwiftError::InvalidRange => "InvalidRange",
            SwiftError::Conflict => "Conflict",
            SwiftError::NotAuthorized => "Unauthorized",
            SwiftError::MethodNotAllowed => "MethodNotAllowed",
            SwiftError::Forbidden { .. } => "Operation forbidden",
            SwiftError::BadRequest { .. } => "Bad Request",
            SwiftError::InternalError(_) => "InternalError",
        }
    }

    /// Return the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SwiftError::InvalidUri => StatusCode::BAD_REQUEST,
            SwiftError::NoSuchAccount => StatusCode::NOT_FOUND,
            SwiftError::NoSuchContainer => StatusCode::NOT_FOUND,
            SwiftError::NoSuchObject => StatusCode::NOT_FOUND,
            SwiftError::NoSuchKey => StatusCode::NOT_FOUND,
            SwiftError::InvalidContainerName => StatusCode::BAD_REQUEST,
            SwiftError::InvalidDigest => StatusCode::BAD_REQUEST,
            SwiftError::BadETag => StatusCode::UNPROCESSABLE_ENTITY,
            SwiftError::IncompleteBody => StatusCode::BAD_REQUEST,
            SwiftError::EntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            SwiftError::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,
            SwiftError::Conflict => StatusCode::CONFLICT,
            SwiftError::NotAuthorized => StatusCode::UNAUTHORIZED,
            SwiftError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SwiftError::Forbidden { .. } => StatusCode::FORBIDDEN,
            SwiftError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            SwiftError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        SwiftError::BadRequest {
            message: message.into(),
        }
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        SwiftError::Forbidden {
            message: message.into(),
        }
    }
}

impl IntoResponse for SwiftError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(status = status.as_u16(), code = self.code(), "request failed: {self}");

        if let SwiftError::InternalError(ref err) = self {
            tracing::error!("internal error: {err:#}");
        }

        (
            status,
            [
                ("content-type", "text/plain; charset=utf-8".to_string()),
                ("x-trans-id", generate_request_id()),
            ],
            self.to_string(),
        )
            .into_response()
    }
}
