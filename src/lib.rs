//! Resource tree library crate
//!
//! An in-memory tree data source for an IDE sidebar view. A [`TreeStore`]
//! holds the resource hierarchy, a [`ServiceRegistry`] maps each node's
//! service category to the presenter that renders it, and a
//! [`TreeDataProvider`] answers the host's queries and broadcasts change
//! notifications.

pub mod api;
pub mod cache;
pub mod cli;
pub mod models;
pub mod provider;
pub mod sample;
pub mod services;
pub mod tree;

pub use models::{DisplayItem, Node, NodeKind, ServiceCategory, TreeChange, ROOT_ID};
pub use provider::{ProviderConfig, ProviderError, TreeDataProvider};
pub use services::{ResolveError, ServiceRegistry, StaticWebAppService, TreeItemService};
pub use tree::TreeStore;
