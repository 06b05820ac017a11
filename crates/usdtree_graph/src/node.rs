// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes and node types.

use crate::nodes::NodeSettings;
use crate::socket::{Socket, SocketId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Where a node type sits in the add-node menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Stage sources
    Input,
    /// Tree outputs
    Output,
    /// Nodes composing several stages
    Composition,
}

/// Template every node of one type is instantiated from
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Type ID, e.g. `usd.MergeNode`
    pub id: String,
    /// Label shown on new nodes
    pub label: String,
    /// Menu category
    pub category: NodeCategory,
    /// Input sockets of a new node
    pub inputs: Vec<Socket>,
    /// Output sockets of a new node
    pub outputs: Vec<Socket>,
    /// Settings of a new node
    pub settings: NodeSettings,
}

/// A node in a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node ID
    pub id: NodeId,
    /// ID of the type this node was created from
    pub type_id: String,
    /// Display name
    pub name: String,
    /// Input sockets, in display order
    pub inputs: Vec<Socket>,
    /// Output sockets, in display order
    pub outputs: Vec<Socket>,
    /// Per-type configuration
    pub settings: NodeSettings,
}

impl Node {
    /// Instantiate `node_type`; every socket gets a fresh ID
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            type_id: node_type.id.clone(),
            name: node_type.label.clone(),
            inputs: node_type.inputs.iter().map(Socket::instantiate).collect(),
            outputs: node_type.outputs.iter().map(Socket::instantiate).collect(),
            settings: node_type.settings.clone(),
        }
    }

    /// Rename the node
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Input socket at `index`
    pub fn input(&self, index: usize) -> Option<&Socket> {
        self.inputs.get(index)
    }

    /// Input socket called `name`
    pub fn input_named(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|s| s.name == name)
    }

    /// Output socket at `index`
    pub fn output(&self, index: usize) -> Option<&Socket> {
        self.outputs.get(index)
    }

    /// Any socket of this node by ID
    pub fn socket(&self, socket_id: SocketId) -> Option<&Socket> {
        self.inputs.iter().chain(&self.outputs).find(|s| s.id == socket_id)
    }

    /// Whether this node is the designated output of its tree
    pub fn is_output_node(&self) -> bool {
        matches!(self.settings, NodeSettings::Output)
    }
}

/// Node types available to a tree, by type ID
#[derive(Debug, Default)]
pub struct NodeRegistry {
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any type with the same ID
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Instantiate the type `type_id`
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{create_usd_registry, FILE_NODE, MERGE_NODE};

    #[test]
    fn test_nodes_get_their_own_sockets() {
        let registry = create_usd_registry();
        let a = registry.create_node(MERGE_NODE).unwrap();
        let b = registry.create_node(MERGE_NODE).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.input(0).unwrap().id, b.input(0).unwrap().id);
        assert_eq!(a.input(0).unwrap().name, b.input(0).unwrap().name);
    }

    #[test]
    fn test_socket_lookup() {
        let node = create_usd_registry().create_node(MERGE_NODE).unwrap().with_name("Merge");
        assert_eq!(node.name, "Merge");
        assert_eq!(node.type_id, MERGE_NODE);

        let second = node.input_named("Input 2").unwrap();
        assert_eq!(node.socket(second.id).unwrap().name, "Input 2");
        let output = node.output(0).unwrap();
        assert_eq!(node.socket(output.id).unwrap().name, "Output");
        assert!(node.socket(SocketId::new()).is_none());
        assert!(!node.is_output_node());
    }

    #[test]
    fn test_registry_lists_types_in_order() {
        let registry = create_usd_registry();
        let ids: Vec<_> = registry.types().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&FILE_NODE));
        assert!(registry.create_node("usd.Unknown").is_none());
    }
}
