use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use resource_tree::models::{CollapsibleState, ResolvedDetails, ResolvedModel, ResourceModel};
use resource_tree::sample::sample_tree;
use resource_tree::{
    DisplayItem, Node, ProviderConfig, ProviderError, ResolveError, ServiceCategory,
    ServiceRegistry, StaticWebAppService, TreeDataProvider, TreeItemService, TreeStore, ROOT_ID,
};

fn test_config() -> ProviderConfig {
    ProviderConfig {
        resolve_delay: Duration::ZERO,
        ..ProviderConfig::default()
    }
}

fn sample_provider() -> TreeDataProvider {
    TreeDataProvider::with_defaults(sample_tree(), &test_config()).unwrap()
}

fn ids(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(Node::id).collect()
}

/// Wraps the static web app presenter, counting resolves and failing the
/// first `failures` of them
struct CountingService {
    inner: StaticWebAppService,
    resolves: Arc<AtomicUsize>,
    failures: usize,
    refresh_delay: Duration,
}

#[async_trait::async_trait]
impl TreeItemService for CountingService {
    fn category(&self) -> ServiceCategory {
        ServiceCategory::StaticWebApp
    }

    fn create_tree_item(&self, model: &ResourceModel) -> DisplayItem {
        self.inner.create_tree_item(model)
    }

    async fn resolve_model(&self, model: &ResourceModel) -> Result<ResolvedModel, ResolveError> {
        let attempt = self.resolves.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(ResolveError::Failed("backend unavailable".to_string()));
        }
        self.inner.resolve_model(model).await
    }

    fn create_resolved_tree_item(&self, model: &ResolvedModel) -> DisplayItem {
        self.inner.create_resolved_tree_item(model)
    }

    async fn refresh(&self, model: &mut ResolvedModel) -> Result<(), ResolveError> {
        tokio::time::sleep(self.refresh_delay).await;
        self.inner.refresh(model).await
    }
}

fn counting_provider(failures: usize) -> (TreeDataProvider, Arc<AtomicUsize>) {
    let resolves = Arc::new(AtomicUsize::new(0));
    let mut registry = ServiceRegistry::new();
    registry.register(CountingService {
        inner: StaticWebAppService::new(Duration::ZERO),
        resolves: resolves.clone(),
        failures,
        refresh_delay: Duration::ZERO,
    });
    let provider = TreeDataProvider::new(sample_tree(), registry, &test_config()).unwrap();
    (provider, resolves)
}

fn slow_provider(
    resolve_delay: Duration,
    refresh_delay: Duration,
) -> (TreeDataProvider, Arc<AtomicUsize>) {
    let resolves = Arc::new(AtomicUsize::new(0));
    let mut registry = ServiceRegistry::new();
    registry.register(CountingService {
        inner: StaticWebAppService::new(resolve_delay),
        resolves: resolves.clone(),
        failures: 0,
        refresh_delay,
    });
    let provider = TreeDataProvider::new(sample_tree(), registry, &test_config()).unwrap();
    (provider, resolves)
}

#[test]
fn test_sample_scenario() {
    let provider = sample_provider();

    assert_eq!(
        ids(provider.get_children(Some("resourceGroup/1"))),
        vec!["hello1", "hello2", "hello3"]
    );
    assert_eq!(
        provider.get_parent("hello2").map(Node::id),
        Some("resourceGroup/1")
    );
    assert!(provider.get_children(Some("hello12")).is_empty());
    assert!(provider.get_parent(ROOT_ID).is_none());

    let item = provider
        .get_tree_item(&Node::leaf("hello1", ServiceCategory::StaticWebApp))
        .unwrap();
    assert_eq!(item.label, "Static Web App (hello1)");
    assert!(!item.is_expandable());
}

#[test]
fn test_every_node_round_trips_through_parent() {
    let provider = sample_provider();
    let store = provider.store();

    assert_eq!(provider.get_children(None), provider.get_children(Some(ROOT_ID)));

    for node in store.nodes() {
        assert_eq!(provider.get_children(Some(node.id())), node.children());
        for child in node.children() {
            assert_eq!(provider.get_parent(child.id()), Some(node));
        }
    }
}

#[test]
fn test_expandable_follows_structure_not_count() {
    let store = TreeStore::new(Node::internal(
        ROOT_ID,
        ServiceCategory::StaticWebApp,
        vec![
            Node::internal("empty", ServiceCategory::StaticWebApp, vec![]),
            Node::leaf("leaf", ServiceCategory::StaticWebApp),
        ],
    ));
    let provider = TreeDataProvider::with_defaults(store, &test_config()).unwrap();

    let empty = provider.find("empty").unwrap();
    let item = provider.get_tree_item(empty).unwrap();
    assert_eq!(item.collapsible_state, CollapsibleState::Collapsed);
    assert!(provider.get_children(Some("empty")).is_empty());

    let leaf = provider.find("leaf").unwrap();
    assert_eq!(
        provider.get_tree_item(leaf).unwrap().collapsible_state,
        CollapsibleState::None
    );
}

#[test]
fn test_queries_are_idempotent() {
    let provider = sample_provider();
    let group = provider.find("resourceGroup/2").unwrap().clone();

    assert_eq!(
        provider.get_children(Some("resourceGroup/2")),
        provider.get_children(Some("resourceGroup/2"))
    );
    assert_eq!(provider.get_parent("hello5"), provider.get_parent("hello5"));
    assert_eq!(
        provider.get_tree_item(&group).unwrap(),
        provider.get_tree_item(&group).unwrap()
    );
    assert!(provider.cached_model("resourceGroup/2").is_none());
}

#[test]
fn test_missing_presenter_fails_fast() {
    let result = TreeDataProvider::new(sample_tree(), ServiceRegistry::new(), &test_config());
    assert!(matches!(
        result,
        Err(ProviderError::UnregisteredService(ServiceCategory::StaticWebApp))
    ));
}

#[tokio::test]
async fn test_resolve_is_cached_and_announced() {
    let (provider, resolves) = counting_provider(0);
    let mut changes = provider.subscribe();
    let node = provider.find("hello4").unwrap().clone();

    let item = provider.resolve_tree_item(&node).await.unwrap();
    assert_eq!(item.label, "resolved Static Web App (hello4)");
    assert_eq!(item.description.as_deref(), Some("react-basic"));
    assert_eq!(changes.recv().await.unwrap().node_id.as_deref(), Some("hello4"));

    let again = provider.resolve_tree_item(&node).await.unwrap();
    assert_eq!(again, item);
    assert_eq!(resolves.load(Ordering::SeqCst), 1);
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn test_resolve_failure_is_retried_next_time() {
    let (provider, resolves) = counting_provider(1);
    let node = provider.find("hello1").unwrap().clone();

    let err = provider.resolve_tree_item(&node).await.unwrap_err();
    match err {
        ProviderError::Resolve { id, source } => {
            assert_eq!(id, "hello1");
            assert_eq!(source, ResolveError::Failed("backend unavailable".to_string()));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(provider.cached_model("hello1").is_none());

    let item = provider.resolve_tree_item(&node).await.unwrap();
    assert_eq!(item.label, "resolved Static Web App (hello1)");
    assert_eq!(resolves.load(Ordering::SeqCst), 2);
    assert!(provider.cached_model("hello1").is_some());
}

#[tokio::test]
async fn test_refresh_runs_hook_on_cached_model() {
    let provider = sample_provider();
    let node = provider.find("hello2").unwrap().clone();
    provider.resolve_tree_item(&node).await.unwrap();

    let mut changes = provider.subscribe();
    provider.refresh(Some("hello2")).await.unwrap();
    assert_eq!(changes.recv().await.unwrap().node_id.as_deref(), Some("hello2"));

    let model = provider.cached_model("hello2").unwrap();
    assert_eq!(
        model.details,
        ResolvedDetails::StaticWebApp {
            repository_url: "https://github.com/alexweininger/angular-basic.git".to_string(),
            repo_name: "react-basic".to_string(),
        }
    );
}

#[tokio::test]
async fn test_refresh_without_cache_still_notifies() {
    let provider = sample_provider();
    let mut changes = provider.subscribe();

    provider.refresh(Some("hello6")).await.unwrap();
    assert_eq!(changes.recv().await.unwrap().node_id.as_deref(), Some("hello6"));
    assert!(provider.cached_model("hello6").is_none());
}

#[tokio::test]
async fn test_full_refresh_and_invalidate_drop_models() {
    let (provider, resolves) = counting_provider(0);
    for id in ["hello1", "hello5"] {
        let node = provider.find(id).unwrap().clone();
        provider.resolve_tree_item(&node).await.unwrap();
    }

    let mut changes = provider.subscribe();
    provider.invalidate("hello1");
    assert_eq!(changes.recv().await.unwrap().node_id.as_deref(), Some("hello1"));
    assert!(provider.cached_model("hello1").is_none());
    assert!(provider.cached_model("hello5").is_some());

    provider.refresh(None).await.unwrap();
    assert_eq!(changes.recv().await.unwrap().node_id, None);
    assert!(provider.cached_model("hello5").is_none());

    let node = provider.find("hello5").unwrap().clone();
    provider.resolve_tree_item(&node).await.unwrap();
    assert_eq!(resolves.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_resolves_announce_once() {
    let (provider, resolves) = slow_provider(Duration::from_millis(50), Duration::ZERO);
    let mut changes = provider.subscribe();
    let node = provider.find("hello3").unwrap().clone();

    let (first, second) = tokio::join!(
        provider.resolve_tree_item(&node),
        provider.resolve_tree_item(&node)
    );
    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(resolves.load(Ordering::SeqCst), 2);
    assert_eq!(changes.recv().await.unwrap().node_id.as_deref(), Some("hello3"));
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn test_dropped_model_stays_dropped_after_slow_refresh() {
    let (provider, _) = slow_provider(Duration::ZERO, Duration::from_millis(100));
    let node = provider.find("hello1").unwrap().clone();

    for drop_everything in [true, false] {
        provider.resolve_tree_item(&node).await.unwrap();
        assert!(provider.cached_model("hello1").is_some());

        let refreshing = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.refresh(Some("hello1")).await })
        };
        // Let the refresh hook start before dropping the model under it
        tokio::time::sleep(Duration::from_millis(20)).await;
        if drop_everything {
            provider.refresh(None).await.unwrap();
        } else {
            provider.invalidate("hello1");
        }
        refreshing.await.unwrap().unwrap();

        assert!(provider.cached_model("hello1").is_none());
    }
}

#[tokio::test]
async fn test_slow_refresh_updates_model_still_cached() {
    let (provider, _) = slow_provider(Duration::ZERO, Duration::from_millis(20));
    let node = provider.find("hello2").unwrap().clone();
    provider.resolve_tree_item(&node).await.unwrap();

    provider.refresh(Some("hello2")).await.unwrap();
    assert!(matches!(
        provider.cached_model("hello2").unwrap().details,
        ResolvedDetails::StaticWebApp { repository_url, .. } if repository_url.contains("angular-basic")
    ));
}
