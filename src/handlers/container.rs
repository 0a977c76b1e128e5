//! Container operations.

use axum::http::StatusCode;
use tracing::info;

use super::{Context, Reply, Resource};
use crate::errors::SwiftError;
use crate::listing::{list_objects, ListParams, ListRecord};
use crate::store::ResourceKind;

/// `/v1/AUTH_<account>/<container>`. The container may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerResource {
    pub account: String,
    pub name: String,
    pub exists: bool,
}

impl ContainerResource {
    /// Create the container if needed and merge the request's metadata.
    /// Returns `true` when the container was created.
    fn upsert(&self, ctx: &mut Context<'_>) -> Result<bool, SwiftError> {
        let req = ctx.req;
        let account = ctx.account_mut(&self.account)?;
        let created = account.create_container(&self.name)?;
        if created {
            info!("Created container {}/{}", self.account, self.name);
        }
        if let Some(container) = account.containers.get_mut(&self.name) {
            container
                .meta
                .update_from_headers(&req.headers, ResourceKind::Container);
        }
        Ok(created)
    }
}

impl Resource for ContainerResource {
    fn kind(&self) -> &'static str {
        ResourceKind::Container.as_str()
    }

    /// `GET`/`HEAD` -- counters as headers, then the object listing.
    fn get(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        if !self.exists {
            return Err(SwiftError::NoSuchContainer);
        }
        let req = ctx.req;
        let container = ctx
            .account(&self.account)?
            .containers
            .get(&self.name)
            .ok_or(SwiftError::NoSuchContainer)?;

        let mut reply = Reply::new(if req.is_head() {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::OK
        })
        .header("x-container-object-count", container.objects.len())
        .header("x-container-bytes-used", container.bytes);
        container.meta.write_headers(&mut reply.headers);

        if req.is_head() {
            return Ok(reply);
        }

        let params = ListParams {
            delimiter: req.param("delimiter"),
            marker: req.param("marker"),
            prefix: req.param("prefix"),
            path: req.param("path"),
        };
        let entries = list_objects(container, &params);
        if req.wants_json() {
            let records: Vec<ListRecord> = entries.iter().map(|e| e.record()).collect();
            reply.json(&records)
        } else {
            Ok(reply.lines(entries.iter().map(|e| e.name())))
        }
    }

    /// `PUT` -- create (201) or update metadata (202).
    fn put(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        if ctx.req.query.contains_key("extract-archive") {
            return Err(SwiftError::forbidden("Bulk upload is not supported"));
        }
        let status = if self.upsert(ctx)? {
            StatusCode::CREATED
        } else {
            StatusCode::ACCEPTED
        };
        Ok(Reply::new(status))
    }

    /// `POST` -- create if missing, else update metadata and report occupancy.
    fn post(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        if self.upsert(ctx)? {
            return Ok(Reply::new(StatusCode::CREATED));
        }
        let summary = ctx
            .account(&self.account)?
            .containers
            .get(&self.name)
            .ok_or(SwiftError::NoSuchContainer)?
            .summary();
        Reply::new(StatusCode::CREATED).json(&summary)
    }

    /// `DELETE` -- only empty containers may be removed.
    fn delete(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        ctx.account_mut(&self.account)?
            .delete_container(&self.name)?;
        info!("Deleted container {}/{}", self.account, self.name);
        Ok(Reply::new(StatusCode::NO_CONTENT))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::super::test_support::*;
    use super::*;
    use crate::store::records::md5_digest;
    use crate::store::{Object, Store};

    fn put_object(store: &mut Store, container: &str, name: &str, data: &'static [u8]) {
        let mut obj = Object::new(name);
        obj.data = Bytes::from_static(data);
        obj.checksum = md5_digest(data);
        obj.content_type = "text/plain".to_string();
        store
            .account_mut("tera")
            .unwrap()
            .store_object(container, obj)
            .unwrap();
    }

    #[test]
    fn test_put_creates_then_accepts() {
        let mut store = store();
        let req = request("PUT", "/v1/AUTH_tera/photos", &[], b"");
        assert_eq!(run(&mut store, &req).unwrap().status, StatusCode::CREATED);
        assert_eq!(run(&mut store, &req).unwrap().status, StatusCode::ACCEPTED);
        assert_eq!(store.account("tera").unwrap().container_count(), 1);
    }

    #[test]
    fn test_put_invalid_name() {
        let mut store = store();
        let long = format!("/v1/AUTH_tera/{}", "x".repeat(257));
        assert!(matches!(
            run(&mut store, &request("PUT", &long, &[], b"")),
            Err(SwiftError::InvalidContainerName)
        ));
    }

    #[test]
    fn test_put_extract_archive_forbidden() {
        let mut store = store();
        let req = request("PUT", "/v1/AUTH_tera/photos?extract-archive=tar", &[], b"");
        assert!(matches!(
            run(&mut store, &req),
            Err(SwiftError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_put_metadata_and_clear() {
        let mut store = store();
        let req = request(
            "PUT",
            "/v1/AUTH_tera/photos",
            &[("X-Container-Meta-Color", "blue")],
            b"",
        );
        run(&mut store, &req).unwrap();
        let req = request("HEAD", "/v1/AUTH_tera/photos", &[], b"");
        let reply = run(&mut store, &req).unwrap();
        assert_eq!(reply.headers["x-container-meta-color"], "blue");

        let req = request(
            "POST",
            "/v1/AUTH_tera/photos",
            &[("X-Container-Meta-Color", "")],
            b"",
        );
        run(&mut store, &req).unwrap();
        assert!(store.account("tera").unwrap().containers["photos"]
            .meta
            .is_empty());
    }

    #[test]
    fn test_post_creates_then_summarizes() {
        let mut store = store();
        let req = request("POST", "/v1/AUTH_tera/docs", &[], b"");
        let reply = run(&mut store, &req).unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);
        assert!(reply.body.is_empty());

        put_object(&mut store, "docs", "a", b"hello");
        let reply = run(&mut store, &req).unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);
        let parsed: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({"count": 1, "bytes": 5, "name": "docs"})
        );
    }

    #[test]
    fn test_get_missing_container() {
        let mut store = store();
        assert!(matches!(
            run(&mut store, &request("GET", "/v1/AUTH_tera/nope", &[], b"")),
            Err(SwiftError::NoSuchContainer)
        ));
    }

    #[test]
    fn test_get_plain_listing_with_delimiter() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("c").unwrap();
        for name in ["a/x", "a/y", "b/z", "top"] {
            put_object(&mut store, "c", name, b"1");
        }
        let reply = run(
            &mut store,
            &request("GET", "/v1/AUTH_tera/c?delimiter=/", &[], b""),
        )
        .unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(&reply.body[..], b"a/\nb/\ntop\n");
        assert_eq!(reply.headers["x-container-object-count"], "4");
        assert_eq!(reply.headers["x-container-bytes-used"], "4");
    }

    #[test]
    fn test_get_json_listing() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("c").unwrap();
        put_object(&mut store, "c", "dir/file", b"hello");
        put_object(&mut store, "c", "plain", b"hi");
        let reply = run(
            &mut store,
            &request("GET", "/v1/AUTH_tera/c?format=json&delimiter=/", &[], b""),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], serde_json::json!({"subdir": "dir/"}));
        assert_eq!(items[1]["name"], "plain");
        assert_eq!(items[1]["bytes"], 2);
        assert_eq!(items[1]["hash"], hex::encode(md5_digest(b"hi")));
        assert_eq!(items[1]["content_type"], "text/plain");
    }

    #[test]
    fn test_empty_json_listing_is_array() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("c").unwrap();
        let reply = run(
            &mut store,
            &request("GET", "/v1/AUTH_tera/c?format=json", &[], b""),
        )
        .unwrap();
        assert_eq!(&reply.body[..], b"[]");
    }

    #[test]
    fn test_delete_lifecycle() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("c").unwrap();
        put_object(&mut store, "c", "a", b"1");
        let req = request("DELETE", "/v1/AUTH_tera/c", &[], b"");
        assert!(matches!(run(&mut store, &req), Err(SwiftError::Conflict)));

        store.account_mut("tera").unwrap().remove_object("c", "a").unwrap();
        assert_eq!(run(&mut store, &req).unwrap().status, StatusCode::NO_CONTENT);
        assert!(matches!(
            run(&mut store, &req),
            Err(SwiftError::NoSuchContainer)
        ));
    }

    #[test]
    fn test_copy_not_allowed() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("c").unwrap();
        assert!(matches!(
            run(&mut store, &request("COPY", "/v1/AUTH_tera/c", &[], b"")),
            Err(SwiftError::MethodNotAllowed)
        ));
    }
}
