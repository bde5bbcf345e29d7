//! Tree data provider
//!
//! The object a host view talks to. It ties the tree store to the presenter
//! registry, keeps the resolved-model cache and broadcasts change
//! notifications so the host knows when to re-query.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::ResolvedCache;
use crate::models::{CollapsibleState, DisplayItem, Node, ResolvedModel, ServiceCategory, TreeChange};
use crate::services::{ResolveError, ServiceRegistry, TreeItemService};
use crate::tree::TreeStore;

/// Provider configuration
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Simulated latency of the built-in resolvers
    pub resolve_delay: Duration,
    /// Buffered change notifications per subscriber before it lags
    pub event_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            resolve_delay: Duration::from_millis(800),
            event_capacity: 100,
        }
    }
}

/// Provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no presenter registered for service category '{0}'")]
    UnregisteredService(ServiceCategory),

    #[error("failed to resolve node '{id}': {source}")]
    Resolve {
        id: String,
        #[source]
        source: ResolveError,
    },

    #[error("failed to refresh node '{id}': {source}")]
    Refresh {
        id: String,
        #[source]
        source: ResolveError,
    },
}

#[derive(Clone)]
pub struct TreeDataProvider {
    store: Arc<TreeStore>,
    registry: Arc<ServiceRegistry>,
    cache: Arc<Mutex<ResolvedCache>>,
    update_tx: Arc<broadcast::Sender<TreeChange>>,
}

impl TreeDataProvider {
    /// Creates a provider, failing if the tree uses a category the registry
    /// does not cover
    pub fn new(
        store: TreeStore,
        registry: ServiceRegistry,
        config: &ProviderConfig,
    ) -> Result<Self, ProviderError> {
        if let Some(node) = store.nodes().find(|n| !registry.contains(n.service())) {
            return Err(ProviderError::UnregisteredService(node.service()));
        }

        let duplicates = store.duplicate_ids();
        if !duplicates.is_empty() {
            warn!(?duplicates, "tree contains duplicate ids; lookups return the first match");
        }

        let (tx, _rx) = broadcast::channel(config.event_capacity.max(1));

        Ok(Self {
            store: Arc::new(store),
            registry: Arc::new(registry),
            cache: Arc::new(Mutex::new(ResolvedCache::new())),
            update_tx: Arc::new(tx),
        })
    }

    /// Creates a provider backed by the built-in presenters
    pub fn with_defaults(store: TreeStore, config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(store, ServiceRegistry::with_defaults(config), config)
    }

    // Runs `f` against the cache; the lock never outlives the call.
    fn with_cache<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ResolvedCache) -> R,
    {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut cache)
    }

    fn service_for(&self, category: ServiceCategory) -> Result<Arc<dyn TreeItemService>, ProviderError> {
        self.registry
            .get(category)
            .cloned()
            .ok_or(ProviderError::UnregisteredService(category))
    }

    fn overlay_state(node: &Node, item: DisplayItem) -> DisplayItem {
        let state = if node.is_internal() {
            CollapsibleState::Collapsed
        } else {
            CollapsibleState::None
        };
        item.with_collapsible_state(state)
    }

    /// Returns the underlying tree store
    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Builds the placeholder display item for a node
    pub fn get_tree_item(&self, node: &Node) -> Result<DisplayItem, ProviderError> {
        let service = self.service_for(node.service())?;
        debug!(id = node.id(), service = %node.service(), "building tree item");
        Ok(Self::overlay_state(
            node,
            service.create_tree_item(&node.to_model()),
        ))
    }

    /// Returns the children of the given node, or of the root when `id` is `None`
    pub fn get_children(&self, id: Option<&str>) -> &[Node] {
        self.store.get_children(id)
    }

    /// Returns the parent of the given node; the root has none
    pub fn get_parent(&self, id: &str) -> Option<&Node> {
        self.store.get_parent(id)
    }

    /// Finds a node by id anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.store.find(id)
    }

    /// Builds the resolved display item for a node, resolving it on first use
    ///
    /// Failures are returned to the caller and leave the cache untouched, so
    /// the next request tries again.
    pub async fn resolve_tree_item(&self, node: &Node) -> Result<DisplayItem, ProviderError> {
        let service = self.service_for(node.service())?;

        let model = match self.cached_model(node.id()) {
            Some(model) => {
                debug!(id = node.id(), "resolved model cache hit");
                model
            }
            None => {
                let resolved = service
                    .resolve_model(&node.to_model())
                    .await
                    .map_err(|source| {
                        warn!(id = node.id(), error = %source, "resolve failed");
                        ProviderError::Resolve {
                            id: node.id().to_string(),
                            source,
                        }
                    })?;
                // A concurrent resolve may have landed first; keep its model
                // and let only the winner announce the change.
                let (model, stored) = self.with_cache(|cache| {
                    let (model, stored) = cache.insert_new(node.id().to_string(), resolved);
                    (model.clone(), stored)
                });
                if stored {
                    self.notify(Some(node.id().to_string()));
                }
                model
            }
        };

        Ok(Self::overlay_state(
            node,
            service.create_resolved_tree_item(&model),
        ))
    }

    /// Handles a manual refresh request
    ///
    /// With an id, the presenter's refresh hook runs against that node's cached
    /// model, if any. Without one, the whole cache is dropped. Either way
    /// subscribers are told to re-query.
    pub async fn refresh(&self, id: Option<&str>) -> Result<(), ProviderError> {
        let Some(id) = id else {
            info!("refreshing whole tree");
            self.with_cache(|cache| cache.clear());
            self.notify(None);
            return Ok(());
        };

        info!(id = id, "refreshing node");
        if let Some(mut model) = self.cached_model(id) {
            let service = self.service_for(model.base.service_id)?;
            service
                .refresh(&mut model)
                .await
                .map_err(|source| ProviderError::Refresh {
                    id: id.to_string(),
                    source,
                })?;
            // The entry may have been dropped while the hook ran.
            let kept = self.with_cache(|cache| match cache.get_mut(id) {
                Some(slot) => {
                    *slot = model;
                    true
                }
                None => false,
            });
            if !kept {
                debug!(id = id, "model dropped during refresh; discarding hook result");
            }
        }
        self.notify(Some(id.to_string()));
        Ok(())
    }

    /// Drops the cached model for a node so the next resolve fetches it again
    pub fn invalidate(&self, id: &str) {
        if self.with_cache(|cache| cache.remove(id)).is_some() {
            debug!(id = id, "invalidated resolved model");
        }
        self.notify(Some(id.to_string()));
    }

    /// Returns a copy of the node's cached resolved model, if any
    pub fn cached_model(&self, id: &str) -> Option<ResolvedModel> {
        self.with_cache(|cache| cache.get(id).cloned())
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TreeChange> {
        self.update_tx.subscribe()
    }

    /// Tells subscribers that a node, or the whole tree when `None`, changed
    pub fn notify(&self, node_id: Option<String>) {
        // No subscribers is fine.
        let _ = self.update_tx.send(TreeChange::new(node_id));
    }
}
