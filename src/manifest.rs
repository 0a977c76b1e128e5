//! Read-time concatenation of segmented ("large") objects.
//!
//! A manifest object carries an `X-Object-Manifest: <container>/<prefix>`
//! attribute. Its logical content is every object in `<container>` whose name
//! starts with `<prefix>`, concatenated in name order. The manifest ETag is
//! the MD5 of the concatenated hex ETags of the segments, not of the bytes.

use bytes::{Bytes, BytesMut};
use md5::{Digest, Md5};

use crate::errors::SwiftError;
use crate::listing::{list_objects, ListEntry, ListParams};
use crate::store::{Account, Object};

/// Parsed `X-Object-Manifest` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestRef<'a> {
    pub container: &'a str,
    pub prefix: &'a str,
}

impl<'a> ManifestRef<'a> {
    /// Split `<container>/<prefix>`; a value without `/` names a whole container.
    pub fn parse(value: &'a str) -> Self {
        let value = value.trim_start_matches('/');
        match value.split_once('/') {
            Some((container, prefix)) => ManifestRef { container, prefix },
            None => ManifestRef {
                container: value,
                prefix: "",
            },
        }
    }
}

/// The resolved segment list of a manifest.
#[derive(Debug)]
pub struct Segments<'a> {
    objects: Vec<&'a Object>,
}

impl<'a> Segments<'a> {
    /// Resolve the segments referenced by `value` within `account`.
    pub fn resolve(account: &'a Account, value: &str) -> Result<Self, SwiftError> {
        let manifest = ManifestRef::parse(value);
        let container = account
            .containers
            .get(manifest.container)
            .ok_or(SwiftError::NoSuchContainer)?;
        let params = ListParams {
            prefix: manifest.prefix,
            ..Default::default()
        };
        let objects = list_objects(container, &params)
            .into_iter()
            .filter_map(|entry| match entry {
                ListEntry::Object(obj) => Some(obj),
                ListEntry::Subdir(_) => None,
            })
            .collect();
        Ok(Self { objects })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sum of all segment sizes.
    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|obj| obj.size()).sum()
    }

    /// Hex MD5 over the concatenated hex ETags of the segments.
    pub fn etag(&self) -> String {
        let mut sum = Md5::new();
        for obj in &self.objects {
            sum.update(obj.etag().as_bytes());
        }
        hex::encode(sum.finalize())
    }

    /// Bytes `[start, end)` of the logical stream.
    pub fn read(&self, start: u64, end: u64) -> Bytes {
        let end = end.min(self.total_size());
        if start >= end {
            return Bytes::new();
        }
        let mut out = BytesMut::with_capacity((end - start) as usize);
        let mut cursor = 0u64;
        for obj in &self.objects {
            let len = obj.size();
            let seg_end = cursor + len;
            if start >= seg_end {
                cursor = seg_end;
                continue;
            }
            if cursor >= end {
                break;
            }
            let from = start.saturating_sub(cursor) as usize;
            let to = (end - cursor).min(len) as usize;
            out.extend_from_slice(&obj.data[from..to]);
            cursor = seg_end;
        }
        out.freeze()
    }
}
