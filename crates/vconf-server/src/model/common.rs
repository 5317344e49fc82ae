//! Shared application state handed to every request handler

use std::sync::Arc;

use vconf_persistence::ConfigStorage;

/// State shared by all gateway handlers
///
/// Holds no request state; every request is handled independently against
/// the storage backend.
pub struct AppState {
    pub storage: Arc<dyn ConfigStorage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ConfigStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &dyn ConfigStorage {
        self.storage.as_ref()
    }
}
