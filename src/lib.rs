//! swiftmock library -- an in-memory OpenStack Swift test double.
//!
//! This crate provides a self-contained Swift v1 object-storage server for
//! integration tests: credential exchange, bearer and temporary-URL auth,
//! account/container/object operations, delimiter listings and segmented
//! (manifest) objects. All state lives in memory for the life of the process.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod listing;
pub mod manifest;
pub mod metrics;
pub mod resolver;
pub mod server;
pub mod store;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::store::Store;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Every account, container, object and session. One lock, held for the
    /// whole of each request.
    pub store: Mutex<Store>,
}

impl AppState {
    /// Build the state with the configured account seeded.
    pub fn new(config: Config) -> Self {
        let mut store = Store::new();
        store.seed_account(
            &config.account.name,
            &config.account.password,
            config.account.temp_url_key.as_deref(),
        );
        Self {
            config,
            store: Mutex::new(store),
        }
    }
}
