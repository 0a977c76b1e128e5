//! Swift v1.0 authentication.
//!
//! Three credential paths guard the storage API:
//! - Credential exchange (`X-Auth-User` / `X-Auth-Key`) mints an opaque
//!   session token recorded against the account.
//! - Bearer tokens (`X-Auth-Token: AUTH_tk...`) must name a live session.
//! - Temporary URLs (`temp_url_sig` / `temp_url_expires`) carry an
//!   HMAC-SHA1 over `"<method>\n<expires>\n<path>"` keyed with the account's
//!   `X-Account-Meta-Temp-Url-Key`. The expiry is bound into the signature
//!   but never compared against the clock.

use axum::http::{HeaderMap, Method};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::errors::SwiftError;
use crate::store::Store;

type HmacSha1 = Hmac<Sha1>;

/// Literal prefix of every issued token.
pub const TOKEN_PREFIX: &str = "AUTH_tk";

/// Account metadata entry holding the temporary-URL secret.
pub const TEMP_URL_KEY_HEADER: &str = "x-account-meta-temp-url-key";

/// Verbs a `HEAD` temporary URL may have been signed for.
const HEAD_SIGNABLE_METHODS: &[&str] = &["GET", "POST", "PUT"];

// ── Credential detection ────────────────────────────────────────────

/// The credential presented on a storage request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential<'a> {
    /// `X-Auth-Token` / `X-Storage-Token` value, prefix still attached.
    Bearer(&'a str),
    /// Temporary-URL query parameters.
    TempUrl { signature: &'a str, expires: &'a str },
    /// Nothing usable was supplied.
    None,
}

/// Pick the credential carried by a request.
///
/// A bearer token wins; signature parameters are only considered when no
/// token is present.
pub fn detect_credential<'a>(
    headers: &'a HeaderMap,
    signature: Option<&'a str>,
    expires: Option<&'a str>,
) -> Credential<'a> {
    let token = header_str(headers, "x-auth-token")
        .or_else(|| header_str(headers, "x-storage-token"))
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        return Credential::Bearer(token);
    }
    match (signature, expires) {
        (Some(signature), Some(expires)) if !signature.is_empty() && !expires.is_empty() => {
            Credential::TempUrl { signature, expires }
        }
        _ => Credential::None,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ── Credential exchange ─────────────────────────────────────────────

/// Username and key offered on the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub user: String,
    pub key: String,
}

impl ExchangeRequest {
    /// Read `X-Auth-User`/`X-Storage-User` and `X-Auth-Key`/`X-Storage-Pass`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user = header_str(headers, "x-auth-user")
            .filter(|u| !u.is_empty())
            .or_else(|| header_str(headers, "x-storage-user"))
            .filter(|u| !u.is_empty())?;
        let key = header_str(headers, "x-auth-key")
            .filter(|k| !k.is_empty())
            .or_else(|| header_str(headers, "x-storage-pass"))
            .unwrap_or("");
        Some(Self {
            user: user.to_string(),
            key: key.to_string(),
        })
    }

    /// Account part of `account:user`.
    pub fn account(&self) -> &str {
        self.user.split(':').next().unwrap_or_default()
    }
}

/// A freshly minted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub account: String,
    /// Token with the `AUTH_tk` prefix, as handed to the client.
    pub token: String,
}

/// Check the credentials and record a new session.
pub fn exchange_credentials(
    store: &mut Store,
    request: &ExchangeRequest,
) -> Result<IssuedToken, SwiftError> {
    let account_name = request.account();
    let password_ok = store
        .account(account_name)
        .is_some_and(|account| constant_time_eq(&account.password, &request.key));
    if !password_ok {
        warn!("Credential exchange rejected for account {}", account_name);
        return Err(SwiftError::NotAuthorized);
    }

    let id = generate_token_id();
    store.insert_session(&id, account_name);
    info!("Issued session token for account {}", account_name);

    Ok(IssuedToken {
        account: account_name.to_string(),
        token: format!("{TOKEN_PREFIX}{id}"),
    })
}

/// 16 random bytes as 32 upper-case hex characters.
pub fn generate_token_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode_upper(bytes)
}

// ── Request authorization ───────────────────────────────────────────

/// Validate the credential of a storage request addressed to `account`.
///
/// `path` is the decoded request path the temporary-URL signature is bound
/// to. Returns the acting account name.
pub fn authorize(
    store: &Store,
    method: &Method,
    path: &str,
    account: &str,
    credential: &Credential<'_>,
) -> Result<String, SwiftError> {
    match credential {
        Credential::Bearer(token) => {
            let token: &str = token;
            let id = token.strip_prefix(TOKEN_PREFIX).unwrap_or(token);
            let session = store.session(id).ok_or_else(|| {
                debug!("Unknown session token");
                SwiftError::NotAuthorized
            })?;
            if session.account != account {
                warn!(
                    "Session for account {} used against account {}",
                    session.account, account
                );
                return Err(SwiftError::NotAuthorized);
            }
            Ok(session.account.clone())
        }
        Credential::TempUrl { signature, expires } => {
            let key = store
                .account(account)
                .and_then(|acct| acct.meta.get(TEMP_URL_KEY_HEADER))
                .ok_or_else(|| {
                    debug!("No temp URL key configured for account {}", account);
                    SwiftError::NotAuthorized
                })?;
            if !verify_temp_url(key, method, expires, path, signature) {
                warn!("Temp URL signature mismatch for {} {}", method, path);
                return Err(SwiftError::NotAuthorized);
            }
            debug!("Temp URL auth OK for account {}", account);
            Ok(account.to_string())
        }
        Credential::None => {
            debug!("No credential supplied");
            Err(SwiftError::NotAuthorized)
        }
    }
}

// ── Temporary URLs ──────────────────────────────────────────────────

/// Hex HMAC-SHA1 of `"<method>\n<expires>\n<path>"` keyed with `key`.
pub fn temp_url_signature(key: &str, method: &str, expires: &str, path: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(format!("{method}\n{expires}\n{path}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check a temporary-URL signature for `method`.
///
/// `HEAD` has no verb of its own: a signature made for `GET`, `POST` or
/// `PUT` is accepted.
pub fn verify_temp_url(
    key: &str,
    method: &Method,
    expires: &str,
    path: &str,
    signature: &str,
) -> bool {
    if *method == Method::HEAD {
        HEAD_SIGNABLE_METHODS
            .iter()
            .any(|m| constant_time_eq(&temp_url_signature(key, m, expires, path), signature))
    } else {
        constant_time_eq(
            &temp_url_signature(key, method.as_str(), expires, path),
            signature,
        )
    }
}

/// Constant-time string comparison.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

// ── Tests ───────────────────────────────────────────────────────────
