//! Presenter registry
//!
//! Each service category registers one [`TreeItemService`] describing how its
//! nodes are rendered, resolved and refreshed. The registry is built once at
//! startup and only read afterwards.

mod static_web_app;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::models::{DisplayItem, ResolvedModel, ResourceModel, ServiceCategory};
use crate::provider::ProviderConfig;

pub use static_web_app::StaticWebAppService;

/// Errors a presenter can report while resolving or refreshing a model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("resolution failed: {0}")]
    Failed(String),
}

/// Behavior bundle for one service category
#[async_trait::async_trait]
pub trait TreeItemService: Send + Sync {
    /// The category this service presents
    fn category(&self) -> ServiceCategory;

    /// Builds the cheap placeholder item shown before resolution
    fn create_tree_item(&self, model: &ResourceModel) -> DisplayItem;

    /// Fetches the richer data for a model; may be slow
    async fn resolve_model(&self, model: &ResourceModel) -> Result<ResolvedModel, ResolveError>;

    /// Builds the item shown once a model is resolved
    fn create_resolved_tree_item(&self, model: &ResolvedModel) -> DisplayItem;

    /// Updates a resolved model in place on a manual refresh
    async fn refresh(&self, _model: &mut ResolvedModel) -> Result<(), ResolveError> {
        Ok(())
    }
}

/// Mapping from service category to its presenter
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<ServiceCategory, Arc<dyn TreeItemService>>,
}

impl ServiceRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in service
    pub fn with_defaults(config: &ProviderConfig) -> Self {
        let mut registry = Self::new();
        registry.register(StaticWebAppService::new(config.resolve_delay));
        registry
    }

    /// Registers a service under its own category, replacing any previous one
    pub fn register<S>(&mut self, service: S)
    where
        S: TreeItemService + 'static,
    {
        self.services.insert(service.category(), Arc::new(service));
    }

    /// Looks up the service for a category
    pub fn get(&self, category: ServiceCategory) -> Option<&Arc<dyn TreeItemService>> {
        self.services.get(&category)
    }

    /// Whether a service is registered for the category
    pub fn contains(&self, category: ServiceCategory) -> bool {
        self.services.contains_key(&category)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("categories", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}
