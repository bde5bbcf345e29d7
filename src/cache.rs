//! Cache of resolved models, keyed by node id

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::ResolvedModel;

/// Holds the result of the first successful resolve for each node
#[derive(Debug, Default)]
pub struct ResolvedCache {
    entries: HashMap<String, ResolvedModel>,
}

impl ResolvedCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached model for a node
    pub fn get(&self, id: &str) -> Option<&ResolvedModel> {
        self.entries.get(id)
    }

    /// Returns the cached model for a node, for updating in place
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ResolvedModel> {
        self.entries.get_mut(id)
    }

    /// Stores a model unless the node already has one
    ///
    /// Returns the model now cached for the node and whether it is the one
    /// passed in.
    pub fn insert_new(&mut self, id: String, model: ResolvedModel) -> (&ResolvedModel, bool) {
        match self.entries.entry(id) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(model), true),
        }
    }

    /// Drops the cached model for a node, returning it
    pub fn remove(&mut self, id: &str) -> Option<ResolvedModel> {
        self.entries.remove(id)
    }

    /// Drops every cached model
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
