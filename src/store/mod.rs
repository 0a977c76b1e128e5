//! In-memory entity store.
//!
//! Holds every account (and through it every container and object) plus the
//! session table. The store has no locking of its own: the server wraps a
//! single [`Store`] in one mutex held for the whole of each request, which
//! makes every operation linearizable.

pub mod meta;
pub mod records;

use std::collections::HashMap;

pub use meta::{Metadata, ResourceKind};
pub use records::{Account, Container, ContainerSummary, Object, ObjectEntry, Session};

use crate::auth::TEMP_URL_KEY_HEADER;

#[derive(Debug, Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, Session>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) an account. Used once at startup.
    pub fn seed_account(&mut self, name: &str, password: &str, temp_url_key: Option<&str>) {
        let mut account = Account::new(name, password);
        if let Some(key) = temp_url_key {
            account.meta.insert(TEMP_URL_KEY_HEADER, key);
        }
        self.accounts.insert(name.to_string(), account);
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn account_mut(&mut self, name: &str) -> Option<&mut Account> {
        self.accounts.get_mut(name)
    }

    /// Record a session for `account` under the bare (unprefixed) token.
    pub fn insert_session(&mut self, token: &str, account: &str) {
        self.sessions.insert(
            token.to_string(),
            Session {
                account: account.to_string(),
            },
        );
    }

    pub fn session(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
