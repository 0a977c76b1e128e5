//! Account-root operations.

use axum::http::StatusCode;

use super::{Context, Reply, Resource};
use crate::errors::SwiftError;
use crate::listing::list_containers;
use crate::store::{ContainerSummary, ResourceKind};

/// `/v1/AUTH_<account>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootResource {
    pub account: String,
}

impl Resource for RootResource {
    fn kind(&self) -> &'static str {
        ResourceKind::Account.as_str()
    }

    /// `GET`/`HEAD` -- usage headers and the container listing.
    fn get(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        let account = ctx.account(&self.account)?;
        let req = ctx.req;

        let mut reply = Reply::new(if req.is_head() {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::OK
        })
        .header("x-account-bytes-used", account.bytes_used)
        .header("x-account-container-count", account.container_count())
        .header("x-account-object-count", account.object_count);
        account.meta.write_headers(&mut reply.headers);

        if req.is_head() {
            return Ok(reply);
        }

        let containers = list_containers(account, req.param("prefix"), req.param("marker"));
        if req.wants_json() {
            let summaries: Vec<ContainerSummary> =
                containers.iter().map(|c| c.summary()).collect();
            reply.json(&summaries)
        } else {
            Ok(reply.lines(containers.iter().map(|c| c.name.as_str())))
        }
    }

    /// `POST` -- merge account metadata.
    fn post(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        let req = ctx.req;
        let account = ctx.account_mut(&self.account)?;
        account
            .meta
            .update_from_headers(&req.headers, ResourceKind::Account);
        Ok(Reply::new(StatusCode::NO_CONTENT))
    }

    /// `DELETE` -- bulk delete is refused, anything else is not allowed.
    fn delete(&self, ctx: &mut Context<'_>) -> Result<Reply, SwiftError> {
        if ctx.req.param("bulk-delete") == "1" {
            return Err(SwiftError::forbidden("Bulk delete is not supported"));
        }
        Err(SwiftError::MethodNotAllowed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_get_lists_containers_with_usage_headers() {
        let mut store = store();
        let account = store.account_mut("tera").unwrap();
        account.create_container("b").unwrap();
        account.create_container("a").unwrap();

        let reply = run(&mut store, &request("GET", "/v1/AUTH_tera", &[], b"")).unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers["x-account-container-count"], "2");
        assert_eq!(reply.headers["x-account-bytes-used"], "0");
        assert_eq!(&reply.body[..], b"a\nb\n");
    }

    #[test]
    fn test_get_json_with_marker() {
        let mut store = store();
        let account = store.account_mut("tera").unwrap();
        for name in ["a", "b", "c"] {
            account.create_container(name).unwrap();
        }
        let reply = run(
            &mut store,
            &request("GET", "/v1/AUTH_tera?format=json&marker=a", &[], b""),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"count": 0, "bytes": 0, "name": "b"},
                {"count": 0, "bytes": 0, "name": "c"}
            ])
        );
    }

    #[test]
    fn test_head_has_no_body() {
        let mut store = store();
        store.account_mut("tera").unwrap().create_container("a").unwrap();
        let reply = run(&mut store, &request("HEAD", "/v1/AUTH_tera", &[], b"")).unwrap();
        assert!(reply.body.is_empty());
        assert_eq!(reply.headers["x-account-container-count"], "1");
    }

    #[test]
    fn test_post_sets_metadata() {
        let mut store = store();
        let req = request(
            "POST",
            "/v1/AUTH_tera",
            &[
                ("x-account-meta-temp-url-key", "secret"),
                ("x-container-meta-ignored", "x"),
            ],
            b"",
        );
        run(&mut store, &req).unwrap();
        let meta = &store.account("tera").unwrap().meta;
        assert_eq!(meta.get("X-Account-Meta-Temp-Url-Key"), Some("secret"));
        assert_eq!(meta.len(), 1);

        let reply = run(&mut store, &request("HEAD", "/v1/AUTH_tera", &[], b"")).unwrap();
        assert_eq!(reply.headers["x-account-meta-temp-url-key"], "secret");
    }

    #[test]
    fn test_unsupported_verbs() {
        let mut store = store();
        for method in ["PUT", "COPY", "DELETE"] {
            assert!(matches!(
                run(&mut store, &request(method, "/v1/AUTH_tera", &[], b"")),
                Err(SwiftError::MethodNotAllowed)
            ));
        }
        assert!(matches!(
            run(
                &mut store,
                &request("DELETE", "/v1/AUTH_tera?bulk-delete=1", &[], b"")
            ),
            Err(SwiftError::Forbidden { .. })
        ));
    }
}
