//! Built-in sample hierarchy used by the server when no tree file is given

use crate::models::{Node, ServiceCategory::StaticWebApp, ROOT_ID};
use crate::tree::TreeStore;

/// Builds the sample resource tree
///
/// ```text
/// root
/// ├── resourceGroup/1
/// │   ├── hello1
/// │   ├── hello2
/// │   └── hello3
/// ├── hello12
/// ├── resourceGroup/2
/// │   ├── hello4
/// │   ├── hello5
/// │   └── hello6
/// └── hello14
/// ```
pub fn sample_tree() -> TreeStore {
    TreeStore::new(Node::internal(
        ROOT_ID,
        StaticWebApp,
        vec![
            group("resourceGroup/1", &["hello1", "hello2", "hello3"]),
            Node::leaf("hello12", StaticWebApp),
            group("resourceGroup/2", &["hello4", "hello5", "hello6"]),
            Node::leaf("hello14", StaticWebApp),
        ],
    ))
}

fn group(id: &str, leaves: &[&str]) -> Node {
    Node::internal(
        id,
        StaticWebApp,
        leaves
            .iter()
            .map(|leaf| Node::leaf(*leaf, StaticWebApp))
            .collect(),
    )
}
