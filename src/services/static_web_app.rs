use std::time::Duration;

use crate::models::{DisplayItem, ResolvedDetails, ResolvedModel, ResourceModel, ServiceCategory};

use super::{ResolveError, TreeItemService};

const REPOSITORY_URL: &str = "https://github.com/alexweininger/react-basic.git";
const REPO_NAME: &str = "react-basic";
const REFRESHED_REPOSITORY_URL: &str = "https://github.com/alexweininger/angular-basic.git";

/// Presenter for static web app resources
///
/// Resolution is simulated: it waits `resolve_delay` and returns a fixed
/// repository.
#[derive(Debug, Clone)]
pub struct StaticWebAppService {
    resolve_delay: Duration,
}

impl StaticWebAppService {
    pub fn new(resolve_delay: Duration) -> Self {
        Self { resolve_delay }
    }
}

#[async_trait::async_trait]
impl TreeItemService for StaticWebAppService {
    fn category(&self) -> ServiceCategory {
        ServiceCategory::StaticWebApp
    }

    fn create_tree_item(&self, model: &ResourceModel) -> DisplayItem {
        DisplayItem::new(format!("Static Web App ({})", model.id))
    }

    async fn resolve_model(&self, model: &ResourceModel) -> Result<ResolvedModel, ResolveError> {
        tokio::time::sleep(self.resolve_delay).await;
        Ok(ResolvedModel {
            base: model.clone(),
            details: ResolvedDetails::StaticWebApp {
                repository_url: REPOSITORY_URL.to_string(),
                repo_name: REPO_NAME.to_string(),
            },
        })
    }

    fn create_resolved_tree_item(&self, model: &ResolvedModel) -> DisplayItem {
        let item = DisplayItem::new(format!("resolved Static Web App ({})", model.base.id));
        match &model.details {
            ResolvedDetails::StaticWebApp { repo_name, .. } => item.with_description(repo_name),
        }
    }

    async fn refresh(&self, model: &mut ResolvedModel) -> Result<(), ResolveError> {
        match &mut model.details {
            ResolvedDetails::StaticWebApp { repository_url, .. } => {
                *repository_url = REFRESHED_REPOSITORY_URL.to_string();
            }
        }
        Ok(())
    }
}
