use std::sync::Arc;

use novachat_registry::Registry;
use novachat_transport::WebSocketTransport;

/// Shared axum application state: just the registry, the server's only
/// mutable shared state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry<WebSocketTransport>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            registry: Arc::new(Registry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
