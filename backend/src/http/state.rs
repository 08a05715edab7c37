//! Application state for the HTTP server.

use std::sync::Arc;

use crate::service::{ForecastService, SharedService};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Forecast pipeline over the loaded model registry
    pub service: SharedService,
}

impl AppState {
    /// Create a new application state around a loaded service.
    pub fn new(service: ForecastService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
