use std::sync::Arc;

use crate::application::client_registry::ClientRegistry;
use crate::infrastructure::db::repositories::Repositories;

/// Shared application resources used by the HTTP layer.
pub struct AppContext {
    pub repos: Repositories,
    pub registry: Arc<ClientRegistry>,
}

impl AppContext {
    /// Build a new application context over the given repositories.
    pub fn new(repos: Repositories) -> Self {
        let registry = Arc::new(ClientRegistry::new(repos.clone()));
        Self { repos, registry }
    }
}
