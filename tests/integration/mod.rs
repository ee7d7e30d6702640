//! Integration tests for building, restructuring and querying typed trees.

mod ownership;
mod pseudo;
mod roundtrip;
mod search;

use ast_select::{estree, NodeId, Tree, Value};

pub const NESTED_EMPTY: &str = include_str!("../fixtures/nested_empty.json");
pub const SCOPES: &str = include_str!("../fixtures/scopes.json");

/// Builds a fixture into a fresh ESTree tree and returns its root node.
pub fn load(fixture: &str) -> (Tree, NodeId) {
    let mut tree = Tree::new(estree().unwrap());
    let root = tree.parse_json(fixture).unwrap().as_node().unwrap();
    (tree, root)
}

/// Type names of node results, display text for everything else.
pub fn type_names(tree: &Tree, values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(|value| match value.as_node() {
            Some(node) => tree.type_name(node).to_string(),
            None => value.to_string(),
        })
        .collect()
}

/// Every Identifier in the tree with the given name, in arena order.
pub fn identifiers(tree: &Tree, name: &str) -> Vec<NodeId> {
    tree.node_ids()
        .filter(|id| {
            tree.type_name(*id) == "Identifier"
                && tree.get(*id, "name").unwrap().as_str() == Some(name)
        })
        .collect()
}
