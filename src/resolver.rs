//! Maps request paths onto account, container and object resources.
//!
//! Paths have the shape `/v1/AUTH_<account>[/<container>[/<object>]]`,
//! optionally under `/auth`. The object part may contain `/`; it is treated
//! as an opaque name here.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::errors::SwiftError;
use crate::handlers::account::RootResource;
use crate::handlers::container::ContainerResource;
use crate::handlers::object::ObjectResource;
use crate::handlers::Resource;
use crate::store::Store;

static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/auth)?/v1/AUTH_([a-zA-Z0-9]+)(?:/([^/]+)(?:/(.*))?)?/?$")
        .expect("path pattern is valid")
});

/// The names carried by a storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub account: String,
    pub container: Option<String>,
    pub object: Option<String>,
}

/// Split a decoded request path into its account, container and object names.
pub fn parse_path(path: &str) -> Result<Address, SwiftError> {
    let caps = PATH_PATTERN.captures(path).ok_or(SwiftError::InvalidUri)?;
    let part = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(Address {
        account: caps[1].to_string(),
        container: part(2),
        object: part(3),
    })
}

/// The resource a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Root(RootResource),
    Container(ContainerResource),
    Object(ObjectResource),
}

impl Target {
    pub fn resource(&self) -> &dyn Resource {
        match self {
            Target::Root(r) => r,
            Target::Container(r) => r,
            Target::Object(r) => r,
        }
    }
}

/// Locate (or stage) the resource named by `address`.
///
/// A missing container is not an error for container resources, since PUT
/// and POST create it. Object resources require the container to exist; the
/// object itself may be absent.
pub fn resolve(
    store: &Store,
    address: &Address,
    version: Option<&str>,
) -> Result<Target, SwiftError> {
    let account = store
        .account(&address.account)
        .ok_or(SwiftError::NoSuchAccount)?;

    let Some(container_name) = &address.container else {
        return Ok(Target::Root(RootResource {
            account: account.name.clone(),
        }));
    };

    let container = account.containers.get(container_name);
    let Some(object_name) = &address.object else {
        return Ok(Target::Container(ContainerResource {
            account: account.name.clone(),
            name: container_name.clone(),
            exists: container.is_some(),
        }));
    };

    let container = container.ok_or(SwiftError::NoSuchContainer)?;
    let exists = container.objects.contains_key(object_name);
    debug!(
        "Resolved object {}/{} (exists: {})",
        container_name, object_name, exists
    );
    Ok(Target::Object(ObjectResource {
        account: account.name.clone(),
        container: container_name.clone(),
        name: object_name.clone(),
        version: version.map(str::to_string),
        exists,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        let mut store = Store::new();
        store.seed_account("tera", "tera", None);
        let account = store.account_mut("tera").unwrap();
        account.create_container("photos").unwrap();
        store
    }

    #[test]
    fn test_parse_account_only() {
        let addr = parse_path("/v1/AUTH_tera").unwrap();
        assert_eq!(addr.account, "tera");
        assert_eq!(addr.container, None);
        assert_eq!(addr.object, None);
        assert_eq!(parse_path("/v1/AUTH_tera/").unwrap(), addr);
    }

    #[test]
    fn test_parse_object_with_slashes() {
        let addr = parse_path("/v1/AUTH_tera/photos/2024/jan/cat.jpg").unwrap();
        assert_eq!(addr.container.as_deref(), Some("photos"));
        assert_eq!(addr.object.as_deref(), Some("2024/jan/cat.jpg"));
    }

    #[test]
    fn test_parse_auth_prefix() {
        let addr = parse_path("/auth/v1/AUTH_tera/photos").unwrap();
        assert_eq!(addr.container.as_deref(), Some("photos"));
    }

    #[test]
    fn test_parse_invalid() {
        for path in ["/", "/v1", "/v1/tera", "/v2/AUTH_tera", "/v1/AUTH_te-ra/c"] {
            assert!(
                matches!(parse_path(path), Err(SwiftError::InvalidUri)),
                "{path}"
            );
        }
    }

    #[test]
    fn test_resolve_root() {
        let target = resolve(&store(), &parse_path("/v1/AUTH_tera").unwrap(), None).unwrap();
        assert!(matches!(target, Target::Root(_)));
    }

    #[test]
    fn test_resolve_unknown_account() {
        let addr = parse_path("/v1/AUTH_nobody/photos").unwrap();
        assert!(matches!(
            resolve(&store(), &addr, None),
            Err(SwiftError::NoSuchAccount)
        ));
    }

    #[test]
    fn test_resolve_missing_container_is_staged() {
        let addr = parse_path("/v1/AUTH_tera/new").unwrap();
        match resolve(&store(), &addr, None).unwrap() {
            Target::Container(c) => {
                assert_eq!(c.name, "new");
                assert!(!c.exists);
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_resolve_object_requires_container() {
        let addr = parse_path("/v1/AUTH_tera/new/obj").unwrap();
        assert!(matches!(
            resolve(&store(), &addr, None),
            Err(SwiftError::NoSuchContainer)
        ));
    }

    #[test]
    fn test_resolve_missing_object_is_staged() {
        let addr = parse_path("/v1/AUTH_tera/photos/a/b").unwrap();
        match resolve(&store(), &addr, Some("v1")).unwrap() {
            Target::Object(o) => {
                assert_eq!(o.container, "photos");
                assert_eq!(o.name, "a/b");
                assert_eq!(o.version.as_deref(), Some("v1"));
                assert!(!o.exists);
            }
            other => panic!("unexpected target {other:?}"),
        }
    }
}
