//! Core models for the resource-tree library
//!
//! This module contains the data types shared by the tree store, the presenter
//! registry and the host-facing API: nodes, display items, resolved models and
//! change notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Id of the single node at the top of every tree
pub const ROOT_ID: &str = "root";

/// Tag selecting which presenter behaviors apply to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceCategory {
    StaticWebApp,
}

impl ServiceCategory {
    /// Returns the wire name of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::StaticWebApp => "staticWebApp",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staticWebApp" => Ok(ServiceCategory::StaticWebApp),
            other => Err(format!("unknown service category '{}'", other)),
        }
    }
}

/// Whether a node carries children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Internal { children: Vec<Node> },
    Leaf,
}

/// One entry in the resource hierarchy
///
/// On the wire a node is `{ "id", "service", "children"? }`; the presence of
/// `children`, even when empty, makes the node internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    id: String,
    service: ServiceCategory,
    kind: NodeKind,
}

impl Node {
    /// Creates a leaf node
    pub fn leaf(id: impl Into<String>, service: ServiceCategory) -> Self {
        Self {
            id: id.into(),
            service,
            kind: NodeKind::Leaf,
        }
    }

    /// Creates an internal node with the given children, in order
    pub fn internal(id: impl Into<String>, service: ServiceCategory, children: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            service,
            kind: NodeKind::Internal { children },
        }
    }

    /// Gets the id of this node
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the service category of this node
    pub fn service(&self) -> ServiceCategory {
        self.service
    }

    /// Gets the kind of this node
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns true if this node carries a children list, empty or not
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, NodeKind::Internal { .. })
    }

    /// Gets the children of this node; leaves have none
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf => &[],
        }
    }

    /// Builds the minimal model handed to presenters
    pub fn to_model(&self) -> ResourceModel {
        ResourceModel {
            id: self.id.clone(),
            name: self.id.clone(),
            resource_type: self.service.as_str().to_string(),
            service_id: self.service,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct RawNode {
    id: String,
    service: ServiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let kind = match raw.children {
            Some(children) => NodeKind::Internal { children },
            None => NodeKind::Leaf,
        };
        Self {
            id: raw.id,
            service: raw.service,
            kind,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let children = match node.kind {
            NodeKind::Internal { children } => Some(children),
            NodeKind::Leaf => None,
        };
        Self {
            id: node.id,
            service: node.service,
            children,
        }
    }
}

/// Placeholder model derived from a node before any resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceModel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub service_id: ServiceCategory,
}

/// Category-specific fields filled in by a resolve step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "camelCase")]
pub enum ResolvedDetails {
    #[serde(rename_all = "camelCase")]
    StaticWebApp {
        repository_url: String,
        repo_name: String,
    },
}

/// A resource model enriched with the data its presenter resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModel {
    #[serde(flatten)]
    pub base: ResourceModel,
    pub details: ResolvedDetails,
}

/// Expand/collapse state understood by the host view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollapsibleState {
    #[default]
    None,
    Collapsed,
    Expanded,
}

/// Renderable representation of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub collapsible_state: CollapsibleState,
}

impl DisplayItem {
    /// Creates an item with just a label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            collapsible_state: CollapsibleState::None,
        }
    }

    /// Sets the description shown next to the label
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the expand/collapse state
    pub fn with_collapsible_state(mut self, state: CollapsibleState) -> Self {
        self.collapsible_state = state;
        self
    }

    /// Returns true if the host should offer to expand this item
    pub fn is_expandable(&self) -> bool {
        self.collapsible_state != CollapsibleState::None
    }
}

/// Notification that the host should re-query part of the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeChange {
    /// The node that changed; `None` means re-render everything
    pub node_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TreeChange {
    /// Stamps a change to a node, or to the whole tree when `node_id` is `None`
    pub fn new(node_id: Option<String>) -> Self {
        Self {
            node_id,
            timestamp: Utc::now(),
        }
    }
}
