//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use deviceadm_core::config::AppConfig;
use deviceadm_service::AdmissionService;

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Admission engine.
    pub admission: Arc<AdmissionService>,
}

impl AppState {
    /// Creates the state from its parts.
    pub fn new(config: AppConfig, admission: AdmissionService) -> Self {
        Self {
            config: Arc::new(config),
            admission: Arc::new(admission),
        }
    }
}
