//! Ordered, paginated listings of containers and objects.
//!
//! Entries are produced in lexicographic name order. Pseudo-directories
//! synthesized by delimiter grouping are de-duplicated only against the
//! previously emitted pseudo-directory; this relies on the sort.

use serde::Serialize;

use crate::store::{Account, Container, Object, ObjectEntry};

/// Query parameters controlling an object listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams<'a> {
    pub delimiter: &'a str,
    /// Exclusive start cursor.
    pub marker: &'a str,
    pub prefix: &'a str,
    /// Only objects whose directory component equals this path.
    pub path: &'a str,
}

/// One item of an object listing.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry<'a> {
    Object(&'a Object),
    Subdir(String),
}

impl ListEntry<'_> {
    pub fn name(&self) -> &str {
        match self {
            ListEntry::Object(obj) => &obj.name,
            ListEntry::Subdir(name) => name,
        }
    }

    pub fn record(&self) -> ListRecord {
        match self {
            ListEntry::Object(obj) => ListRecord::Object(obj.entry()),
            ListEntry::Subdir(name) => ListRecord::Subdir {
                subdir: name.clone(),
            },
        }
    }
}

/// JSON form of a [`ListEntry`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListRecord {
    Object(ObjectEntry),
    Subdir { subdir: String },
}

/// List the objects of `container`.
pub fn list_objects<'a>(container: &'a Container, params: &ListParams<'_>) -> Vec<ListEntry<'a>> {
    let prefix = params.prefix;
    let mut matching: Vec<&Object> = container
        .objects
        .values()
        .filter(|obj| obj.name.starts_with(prefix))
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));

    let parent = (!params.path.is_empty()).then(|| clean_path(params.path));
    let mut last_subdir: Option<String> = None;
    let mut entries = Vec::new();

    for obj in matching {
        if !obj.name.starts_with(prefix) {
            continue;
        }

        let mut subdir = None;
        if let Some(parent) = &parent {
            if dir_of(&obj.name) != *parent {
                continue;
            }
        } else if !params.delimiter.is_empty() {
            let rest = &obj.name[prefix.len()..];
            if let Some(i) = rest.find(params.delimiter) {
                let name = &obj.name[..prefix.len() + i + params.delimiter.len()];
                if last_subdir.as_deref() == Some(name) {
                    continue;
                }
                subdir = Some(name.to_string());
            }
        }

        let name = subdir.as_deref().unwrap_or(&obj.name);
        if name <= params.marker {
            continue;
        }

        match subdir {
            Some(name) => {
                last_subdir = Some(name.clone());
                entries.push(ListEntry::Subdir(name));
            }
            None => entries.push(ListEntry::Object(obj)),
        }
    }

    entries
}

/// List the containers of `account` whose names start with `prefix` and sort
/// after `marker`.
pub fn list_containers<'a>(account: &'a Account, prefix: &str, marker: &str) -> Vec<&'a Container> {
    let mut matching: Vec<&Container> = account
        .containers
        .values()
        .filter(|c| c.name.starts_with(prefix) && c.name.as_str() > marker)
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    matching
}

/// Directory component of a `/`-separated name; `.` when there is none.
pub fn dir_of(name: &str) -> String {
    match name.rfind('/') {
        Some(i) => clean_path(&name[..i + 1]),
        None => ".".to_string(),
    }
}

/// Lexically normalize a `/`-separated path: collapse repeated slashes,
/// drop `.` elements, resolve `..` and strip any trailing slash.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
