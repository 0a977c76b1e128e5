//! Account, container and object records.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::Serialize;

use super::meta::Metadata;
use crate::errors::SwiftError;

/// Metadata attribute marking an object as a segmented-object manifest.
pub const MANIFEST_HEADER: &str = "x-object-manifest";

/// Compute the binary MD5 digest of `data`.
pub fn md5_digest(data: &[u8]) -> Vec<u8> {
    Md5::digest(data).to_vec()
}

/// A stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub mtime: DateTime<Utc>,
    pub content_type: String,
    pub meta: Metadata,
    pub data: Bytes,
    /// Binary MD5 of `data`.
    pub checksum: Vec<u8>,
}

impl Object {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mtime: Utc::now(),
            content_type: String::new(),
            meta: Metadata::new(),
            data: Bytes::new(),
            checksum: md5_digest(&[]),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Hex-encoded checksum.
    pub fn etag(&self) -> String {
        hex::encode(&self.checksum)
    }

    /// The `<container>/<prefix>` manifest reference, if this object is one.
    pub fn manifest(&self) -> Option<&str> {
        self.meta.get(MANIFEST_HEADER)
    }

    /// JSON listing record.
    pub fn entry(&self) -> ObjectEntry {
        ObjectEntry {
            name: self.name.clone(),
            last_modified: self.mtime.format("%Y-%m-%dT%H:%M:%S").to_string(),
            bytes: self.size(),
            hash: self.etag(),
            content_type: self.content_type.clone(),
        }
    }
}

/// Object entry in a JSON container listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObjectEntry {
    pub name: String,
    pub last_modified: String,
    pub bytes: u64,
    pub hash: String,
    pub content_type: String,
}

/// Container summary used by account listings and container POST.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerSummary {
    pub count: usize,
    pub bytes: u64,
    pub name: String,
}

/// Named bucket of objects.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub ctime: DateTime<Utc>,
    pub meta: Metadata,
    /// Running total of object bytes.
    pub bytes: u64,
    pub objects: HashMap<String, Object>,
}

impl Container {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ctime: Utc::now(),
            meta: Metadata::new(),
            bytes: 0,
            objects: HashMap::new(),
        }
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            count: self.objects.len(),
            bytes: self.bytes,
            name: self.name.clone(),
        }
    }
}

/// Container names are 1-256 bytes and may not contain `/`.
pub fn valid_container_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 256 && !name.contains('/')
}

/// Top-level namespace.
#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub password: String,
    pub meta: Metadata,
    /// Running total of object bytes across all containers.
    pub bytes_used: u64,
    /// Running total of objects across all containers.
    pub object_count: u64,
    pub containers: HashMap<String, Container>,
}

impl Account {
    pub fn new(name: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            meta: Metadata::new(),
            bytes_used: 0,
            object_count: 0,
            containers: HashMap::new(),
        }
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Create `name` if absent. Returns `true` when a container was created.
    pub fn create_container(&mut self, name: &str) -> Result<bool, SwiftError> {
        if self.containers.contains_key(name) {
            return Ok(false);
        }
        if !valid_container_name(name) {
            return Err(SwiftError::InvalidContainerName);
        }
        self.containers
            .insert(name.to_string(), Container::new(name));
        Ok(true)
    }

    /// Remove an empty container.
    pub fn delete_container(&mut self, name: &str) -> Result<Container, SwiftError> {
        let container = self
            .containers
            .get(name)
            .ok_or(SwiftError::NoSuchContainer)?;
        if !container.objects.is_empty() {
            return Err(SwiftError::Conflict);
        }
        self.containers
            .remove(name)
            .ok_or(SwiftError::NoSuchContainer)
    }

    /// Store `object`, replacing any previous object of the same name, and
    /// move the container and account byte counters by the size delta.
    pub fn store_object(&mut self, container: &str, object: Object) -> Result<(), SwiftError> {
        let target = self
            .containers
            .get_mut(container)
            .ok_or(SwiftError::NoSuchContainer)?;
        let size = object.size();
        match target.objects.insert(object.name.clone(), object) {
            Some(previous) => {
                target.bytes = target.bytes.saturating_sub(previous.size());
                self.bytes_used = self.bytes_used.saturating_sub(previous.size());
            }
            None => self.object_count += 1,
        }
        target.bytes += size;
        self.bytes_used += size;
        Ok(())
    }

    /// Remove an object and decrement the counters by its size.
    pub fn remove_object(&mut self, container: &str, name: &str) -> Result<Object, SwiftError> {
        let target = self
            .containers
            .get_mut(container)
            .ok_or(SwiftError::NoSuchContainer)?;
        let removed = target.objects.remove(name).ok_or(SwiftError::NoSuchKey)?;
        target.bytes = target.bytes.saturating_sub(removed.size());
        self.bytes_used = self.bytes_used.saturating_sub(removed.size());
        self.object_count = self.object_count.saturating_sub(1);
        Ok(removed)
    }
}

/// A live bearer-token session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, data: &'static [u8]) -> Object {
        let mut obj = Object::new(name);
        obj.data = Bytes::from_static(data);
        obj.checksum = md5_digest(data);
        obj
    }

    #[test]
    fn test_valid_container_names() {
        assert!(valid_container_name("a"));
        assert!(valid_container_name(&"x".repeat(256)));
        assert!(valid_container_name("with spaces and ünïcode"));
    }

    #[test]
    fn test_invalid_container_names() {
        assert!(!valid_container_name(""));
        assert!(!valid_container_name(&"x".repeat(257)));
        assert!(!valid_container_name("a/b"));
    }

    #[test]
    fn test_create_then_exists() {
        let mut account = Account::new("tera", "tera");
        assert!(account.create_container("photos").unwrap());
        assert!(!account.create_container("photos").unwrap());
        assert!(account.containers.contains_key("photos"));
        assert_eq!(account.container_count(), 1);
    }

    #[test]
    fn test_create_invalid_name_fails() {
        let mut account = Account::new("tera", "tera");
        assert!(matches!(
            account.create_container("a/b"),
            Err(SwiftError::InvalidContainerName)
        ));
        assert_eq!(account.container_count(), 0);
    }

    #[test]
    fn test_byte_accounting() {
        let mut account = Account::new("tera", "tera");
        account.create_container("c").unwrap();
        account.store_object("c", object("a", b"abc")).unwrap();
        account.store_object("c", object("b", b"defgh")).unwrap();
        account.store_object("c", object("d", b"ij")).unwrap();
        assert_eq!(account.containers["c"].bytes, 10);
        assert_eq!(account.bytes_used, 10);
        assert_eq!(account.object_count, 3);

        account.remove_object("c", "b").unwrap();
        assert_eq!(account.containers["c"].bytes, 5);
        assert_eq!(account.bytes_used, 5);
        assert_eq!(account.object_count, 2);
    }

    #[test]
    fn test_overwrite_adjusts_by_delta() {
        let mut account = Account::new("tera", "tera");
        account.create_container("c").unwrap();
        account.store_object("c", object("a", b"abcdef")).unwrap();
        account.store_object("c", object("a", b"xy")).unwrap();
        assert_eq!(account.containers["c"].bytes, 2);
        assert_eq!(account.bytes_used, 2);
        assert_eq!(account.object_count, 1);
    }

    #[test]
    fn test_delete_non_empty_container_conflicts() {
        let mut account = Account::new("tera", "tera");
        account.create_container("c").unwrap();
        account.store_object("c", object("a", b"x")).unwrap();
        assert!(matches!(
            account.delete_container("c"),
            Err(SwiftError::Conflict)
        ));
        account.remove_object("c", "a").unwrap();
        account.delete_container("c").unwrap();
        assert_eq!(account.container_count(), 0);
    }

    #[test]
    fn test_remove_missing_object() {
        let mut account = Account::new("tera", "tera");
        account.create_container("c").unwrap();
        assert!(matches!(
            account.remove_object("c", "nope"),
            Err(SwiftError::NoSuchKey)
        ));
    }

    #[test]
    fn test_entry_fields() {
        let obj = object("notes.txt", b"hello");
        let entry = obj.entry();
        assert_eq!(entry.bytes, 5);
        assert_eq!(entry.hash, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(entry.last_modified.len(), 19);
    }
}
