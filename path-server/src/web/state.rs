//! Application state for the web layer.

use std::sync::Arc;

use crate::service::PathingService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Request orchestrator
    pub pathing: Arc<PathingService>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(pathing: PathingService) -> Self {
        Self {
            pathing: Arc::new(pathing),
        }
    }
}
