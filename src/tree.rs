//! Tree store
//!
//! Owns the static resource hierarchy and answers lookups against it. Every
//! lookup searches the whole tree from the root because callers only hold ids.

use std::collections::HashSet;
use std::path::Path;

use crate::models::{Node, ROOT_ID};

/// Errors raised while loading a tree definition
#[derive(Debug, thiserror::Error)]
pub enum TreeLoadError {
    #[error("failed to read tree file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tree definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tree root must have id 'root', found '{0}'")]
    BadRoot(String),
}

/// Immutable owner of the node graph
#[derive(Debug, Clone)]
pub struct TreeStore {
    root: Node,
}

impl TreeStore {
    /// Creates a store around the given root node
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Loads a tree from its JSON form
    pub fn from_json_str(json: &str) -> Result<Self, TreeLoadError> {
        let root: Node = serde_json::from_str(json)?;
        if root.id() != ROOT_ID {
            return Err(TreeLoadError::BadRoot(root.id().to_string()));
        }
        Ok(Self::new(root))
    }

    /// Loads a tree from a JSON file on disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TreeLoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Returns the root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the immediate children of the node with the given id
    ///
    /// With no id this is the root's children. Leaves and unknown ids yield an
    /// empty slice.
    pub fn get_children(&self, id: Option<&str>) -> &[Node] {
        match id {
            None => self.root.children(),
            Some(id) => self.find(id).map(Node::children).unwrap_or(&[]),
        }
    }

    /// Returns the internal node whose children contain the given id
    pub fn get_parent(&self, id: &str) -> Option<&Node> {
        if id == ROOT_ID || id == self.root.id() {
            return None;
        }
        search(&self.root, &self.root, id, Capture::Parent)
    }

    /// Finds the node with the given id anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&Node> {
        search(&self.root, &self.root, id, Capture::Node)
    }

    /// Iterates every node in pre-order, root first
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            stack: vec![&self.root],
        }
    }

    /// Returns ids that occur more than once, in first-seen order
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for node in self.nodes() {
            if !seen.insert(node.id()) && reported.insert(node.id()) {
                duplicates.push(node.id().to_string());
            }
        }
        duplicates
    }
}

#[derive(Clone, Copy)]
enum Capture {
    Node,
    Parent,
}

// Pre-order DFS, first match wins. `parent` is the closest internal ancestor
// of `node`; the root is its own parent, which `get_parent` filters out.
fn search<'a>(node: &'a Node, parent: &'a Node, id: &str, capture: Capture) -> Option<&'a Node> {
    if node.id() == id {
        return Some(match capture {
            Capture::Node => node,
            Capture::Parent => parent,
        });
    }

    node.children()
        .iter()
        .find_map(|child| search(child, node, id, capture))
}

/// Pre-order iterator over a tree
pub struct Nodes<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
