// Application state module
// Shared state handed to every request handler

use crate::config::Config;
use crate::storage::SharedDocumentStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: SharedDocumentStore,
}

impl AppState {
    pub const fn new(config: Config, store: SharedDocumentStore) -> Self {
        Self { config, store }
    }
}
