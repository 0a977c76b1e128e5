//! Object operations.

use std::time::SystemTime;

use axum::http::StatusCode;
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::percent_decode_str;
use tracing::{debug, info};

use super::{Context, Reply, Resource};
use crate::errors::SwiftError;
use crate::manifest::Segments;
use crate::resolver::{self, Target};
use crate::store::records::md5_digest;
use crate::store::{Metadata, Object, ResourceKind};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// `/v1/AUTH_<account>/<container>/<object>`. The container exists; the
/// object may not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectResource {
    pub account: String,
    pub container: String,
    pub name: String,
    /// `versionId` query parameter. Accepted and ignored.
    pub version: Option<String>,
    pub exists: bool,
}

// -- Range parsing ------------------------------------------------------------

/// A single-range `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    /// `bytes=a-b`, inclusive of `b`.
    Bounded(u64, u64),
    /// `bytes=a-`
    From(u64),
    /// `bytes=-n`, the last `n` bytes.
    Suffix(u64),
}

/// Parse `bytes=a-b`, `bytes=a-` or `bytes=-n`. Anything else (including
/// multi-range requests) is ignored by returning `None`.
fn parse_range_header(value: &str) -> Option<ByteRange> {
    let ranges = value.trim().strip_prefix("bytes=")?;
    if ranges.contains(',') {
        return None;
    }
    let (start, end) = ranges.split_once('-')?;
    match (start.trim(), end.trim()) {
        ("", "") => None,
        ("", n) => match n.parse().ok()? {
            0 => None,
            n => Some(ByteRange::Suffix(n)),
        },
        (a, "") => Some(ByteRange::From(a.parse().ok()?)),
        (a, b) => {
            let (a, b) = (a.parse().ok()?, b.parse().ok()?);
            (a <= b).then_some(ByteRange::Bounded(a, b))
        }
    }
}

/// Resolve `range` against `total` bytes as a half-open `[start, end)`.
/// Returns `None` when the start lies at or past the end.
fn resolve_range(range: ByteRange, total: u64) -> Option<(u64, u64)> {
    let (start, end) = match range {
        ByteRange::Bounded(a, b) => (a, b.saturating_add(1).min(total)),
        ByteRange::From(a) => (a, total),
        ByteRange::Suffix(n) => (total.saturating_sub(n), total),
    };
    (start < end).then_some((start, end))
}

// -- Upload validation --------------------------------------------------------

/// Check an uploaded body against the request's `ETag`, then its
/// `Content-Length`, and return its binary MD5.
fn verify_upload(
    body: &Bytes,
    etag: Option<&str>,
    content_length: Option<&str>,
) -> Result<Vec<u8>, SwiftError> {
    let checksum = md5_digest(body);
    if let Some(etag) = etag.map(|e| e.trim().trim_matches('"')) {
        let expected = hex::decode(etag).map_err(|_| SwiftError::InvalidDigest)?;
        if expected.len() != checksum.len() {
            return Err(SwiftError::InvalidDigest);
        }
        if expected != checksum {
            return Err(SwiftError::BadETag);
        }
    }

    if let Some(declared) = content_length {
        let declared: u64 = declared
            .trim()
            .parse()
            .map_err(|_| SwiftError::bad_request("Invalid Content-Length"))?;
        if declared != body.len() as u64 {
            return Err(SwiftError::IncompleteBody);
        }
    }
    Ok(checksum)
}

/// Content type for a new object: the request header, else a guess from the
/// name's extension.
fn content_type_for(name: &str, header: Option<&str>) -> String {
    match header.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(name)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}

fn http_date(at: chrono::DateTime<Utc>) -> String {
    httpdate::fmt_http_date(SystemTime::from(at))
}

/// Split a decoded `Destination` header into container and object names.
fn parse_destination(value: &str) -> Option<(&str, &str)> {
    let (container, object) = value.trim().trim_start_matches('/').split_once('/')?;
    (!container.is_empty() && !object.is_empty()).then_some((container, object))
}

// -- Operations ---------------------------------------------------------------

impl ObjectResource {
    fn lookup<'a>(&self, ctx: &'a Context<'_>) -> Result<&'a Object, SwiftError> {
        ctx.account(&self.account)?
            .containers
            .get(&self.container)
            .ok_or(SwiftError::NoSuchContainer)?
            .objects
            .get(&self.name)
            .ok_or(SwiftError::NoSuchObject)
    }
}

impl Resource for ObjectResource {
    fn kind(&self) -> &'static str {
        ResourceKind::Object.as_str()
    }

    /// `GET`/`HEAD` -- download, honoring a single `Range`. Manifests are
    /// served as the concatenation of their segments.
    fn get(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        let req = ctx.req;
        let obj = self.lookup(ctx)?;
        let account = ctx.account(&self.account)?;

        let segments = match obj.manifest() {
            Some(value) => Some(Segments::resolve(account, value)?),
            None => None,
        };
        let (total, etag) = match &segments {
            Some(segments) => (segments.total_size(), segments.etag()),
            None => (obj.size(), obj.etag()),
        };

        let range = req.header("range").and_then(parse_range_header);
        let (status, start, end) = match range {
            Some(range) => {
                let (start, end) = resolve_range(range, total).ok_or(SwiftError::InvalidRange)?;
                (StatusCode::PARTIAL_CONTENT, start, end)
            }
            None => (StatusCode::OK, 0, total),
        };

        let mut reply = Reply::new(status);
        obj.meta.write_headers(&mut reply.headers);
        let mut reply = reply
            .header("content-type", &obj.content_type)
            .header("content-length", end - start)
            .header("etag", etag)
            .header("last-modified", http_date(obj.mtime))
            .header("accept-ranges", "bytes");
        if status == StatusCode::PARTIAL_CONTENT {
            reply = reply.header(
                "content-range",
                format!("bytes {}-{}/{}", start, end.saturating_sub(1), total),
            );
        }

        if req.is_head() {
            return Ok(reply);
        }
        let body = match &segments {
            Some(segments) => segments.read(start, end),
            None => obj.data.slice(start as usize..end as usize),
        };
        Ok(reply.body(body))
    }

    /// `PUT` -- upload or replace the object.
    fn put(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        let req = ctx.req;
        if req.body.len() as u64 > ctx.config.server.max_object_size {
            return Err(SwiftError::EntityTooLarge);
        }
        let checksum = verify_upload(
            &req.body,
            req.header("etag"),
            req.header("content-length"),
        )?;

        let mut meta = Metadata::new();
        meta.update_from_headers(&req.headers, ResourceKind::Object);
        let object = Object {
            name: self.name.clone(),
            mtime: Utc::now(),
            content_type: content_type_for(&self.name, req.header("content-type")),
            meta,
            data: req.body.clone(),
            checksum,
        };
        let etag = object.etag();
        let last_modified = http_date(object.mtime);

        ctx.account_mut(&self.account)?
            .store_object(&self.container, object)?;
        debug!(
            "Stored object {}/{} ({} bytes)",
            self.container,
            self.name,
            req.body.len()
        );

        Ok(Reply::new(StatusCode::CREATED)
            .header("etag", etag)
            .header("last-modified", last_modified))
    }

    /// `POST` -- merge object metadata.
    fn post(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        if !self.exists {
            return Err(SwiftError::NoSuchObject);
        }
        let req = ctx.req;
        let obj = ctx
            .account_mut(&self.account)?
            .containers
            .get_mut(&self.container)
            .ok_or(SwiftError::NoSuchContainer)?
            .objects
            .get_mut(&self.name)
            .ok_or(SwiftError::NoSuchObject)?;
        obj.meta
            .update_from_headers(&req.headers, ResourceKind::Object);
        if let Some(ct) = req.header("content-type").filter(|ct| !ct.is_empty()) {
            obj.content_type = ct.to_string();
        }
        Ok(Reply::new(StatusCode::ACCEPTED))
    }

    fn delete(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        ctx.account_mut(&self.account)?
            .remove_object(&self.container, &self.name)?;
        debug!("Deleted object {}/{}", self.container, self.name);
        Ok(Reply::new(StatusCode::NO_CONTENT))
    }

    /// `COPY` -- server-side copy to the object named by `Destination`.
    fn copy(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        let req = ctx.req;
        let source = match self.lookup(ctx) {
            Ok(obj) => obj.clone(),
            Err(SwiftError::NoSuchObject) => return Err(SwiftError::NoSuchKey),
            Err(err) => return Err(err),
        };

        let destination = req
            .header("destination")
            .ok_or_else(|| SwiftError::bad_request("You must provide a Destination header"))?;
        let destination = percent_decode_str(destination).decode_utf8_lossy();

        let invalid = || SwiftError::bad_request(format!("Invalid destination {destination}"));
        let (container, name) = parse_destination(&destination).ok_or_else(invalid)?;
        let path = format!("/v1/AUTH_{}/{}/{}", self.account, container, name);
        let address = resolver::parse_path(&path).map_err(|_| invalid())?;
        let target = resolver::resolve(ctx.store, &address, None).map_err(|_| invalid())?;
        let Target::Object(dest) = target else {
            return Err(invalid());
        };

        let mut copy = Object {
            name: dest.name.clone(),
            mtime: Utc::now(),
            ..source
        };
        copy.meta
            .update_from_headers(&req.headers, ResourceKind::Object);
        let etag = copy.etag();
        ctx.account_mut(&dest.account)?
            .store_object(&dest.container, copy)?;
        info!(
            "Copied {}/{} to {}/{}",
            self.container, self.name, dest.container, dest.name
        );

        Ok(Reply::new(StatusCode::CREATED)
            .header("etag", etag)
            .header("x-copied-from", format!("{}/{}", self.container, self.name)))
    }
}
