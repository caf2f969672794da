//! Application state shared across handlers.

use sitegate_core::MappingRegistry;
use sitegate_core::config::AppConfig;
use sitegate_metadata::MetadataStore;
use sitegate_tenancy::{DomainsManagement, RequestInfo};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Domain filter mappings, built once at boot.
    pub registry: Arc<MappingRegistry>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        registry: MappingRegistry,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            registry: Arc::new(registry),
        }
    }

    /// Fresh, uninitialized domain resolution service for one request.
    pub fn domains_management(&self, request: RequestInfo) -> DomainsManagement {
        DomainsManagement::new(self.metadata.clone(), self.registry.clone(), request)
    }
}
