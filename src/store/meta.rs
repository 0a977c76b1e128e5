//! Header-style metadata attached to accounts, containers and objects.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Headers retained as metadata regardless of resource kind.
const PASSTHROUGH_HEADERS: &[&str] = &[
    "content-type",
    "content-language",
    "content-disposition",
    "content-encoding",
    "expires",
    "cache-control",
    "x-object-manifest",
];

/// The three addressable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Account,
    Container,
    Object,
}

impl ResourceKind {
    /// Lowercased metadata header prefix, e.g. `x-container-meta-`.
    pub fn meta_prefix(self) -> &'static str {
        match self {
            ResourceKind::Account => "x-account-meta-",
            ResourceKind::Container => "x-container-meta-",
            ResourceKind::Object => "x-object-meta-",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Account => "account",
            ResourceKind::Container => "container",
            ResourceKind::Object => "object",
        }
    }
}

/// Whether a header name is kept as metadata for `kind`.
pub fn is_metadata_header(name: &str, kind: ResourceKind) -> bool {
    let name = name.to_ascii_lowercase();
    PASSTHROUGH_HEADERS.contains(&name.as_str()) || name.starts_with(kind.meta_prefix())
}

/// Mapping of lowercased header name to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value stored under `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .insert(name.to_ascii_lowercase(), vec![value.into()]);
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&name.to_ascii_lowercase());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Overlay every entry of `other` onto `self`.
    pub fn merge(&mut self, other: &Metadata) {
        for (name, values) in &other.entries {
            self.entries.insert(name.clone(), values.clone());
        }
    }

    /// Merge the metadata headers of a request into this mapping.
    ///
    /// Headers outside the prefix convention for `kind` and the passthrough
    /// allow-list are ignored. For accounts and containers an empty value
    /// deletes the entry; objects keep empty values.
    pub fn update_from_headers(&mut self, headers: &HeaderMap, kind: ResourceKind) {
        for name in headers.keys() {
            if !is_metadata_header(name.as_str(), kind) {
                continue;
            }
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            let first_empty = values.first().map_or(true, |v| v.is_empty());
            if !first_empty || kind == ResourceKind::Object {
                self.entries.insert(name.as_str().to_string(), values);
            } else {
                self.entries.remove(name.as_str());
            }
        }
    }

    /// Append every entry as a response header.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        for (name, values) in &self.entries {
            let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            headers.remove(&header);
            for value in values {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(header.clone(), value);
                }
            }
        }
    }
}
