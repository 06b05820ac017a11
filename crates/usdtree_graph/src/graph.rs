// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph: nodes plus the links between their sockets.

use crate::link::{Endpoint, Link, LinkId};
use crate::node::{Node, NodeId};
use crate::socket::{Socket, SocketId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Add a node
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node along with its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&node_id)?;
        self.links.retain(|_, link| !link.touches_node(node_id));
        Some(node)
    }

    /// Node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output socket to an input socket.
    ///
    /// Rejects missing sockets, mismatched kinds or directions, a second link
    /// into an input, self-loops and links that would close a cycle.
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<LinkId, LinkError> {
        let source = self.socket(from)?;
        let target = self.socket(to)?;

        if !source.can_link(target) || !source.is_multi_link() {
            return Err(LinkError::IncompatibleSockets);
        }
        if from.node == to.node {
            return Err(LinkError::SelfLoop);
        }
        if self.link_into(to.node, to.socket).is_some() {
            return Err(LinkError::InputAlreadyLinked(to.socket));
        }

        let link = Link::new(from, to);
        let id = link.id;
        self.links.insert(id, link);

        if self.topological_order().is_err() {
            self.links.shift_remove(&id);
            return Err(LinkError::WouldCycle);
        }

        Ok(id)
    }

    /// Link output `output_index` of `from` to input `input_index` of `to`
    pub fn link(
        &mut self,
        from: NodeId,
        output_index: usize,
        to: NodeId,
        input_index: usize,
    ) -> Result<LinkId, LinkError> {
        let output = self.node(from)
            .ok_or(LinkError::NodeNotFound(from))?
            .output(output_index)
            .ok_or(LinkError::NoSocketAt(output_index))?
            .id;
        let input = self.node(to)
            .ok_or(LinkError::NodeNotFound(to))?
            .input(input_index)
            .ok_or(LinkError::NoSocketAt(input_index))?
            .id;

        self.connect(Endpoint::new(from, output), Endpoint::new(to, input))
    }

    /// Remove a link
    pub fn unlink(&mut self, link_id: LinkId) -> Option<Link> {
        self.links.shift_remove(&link_id)
    }

    /// Remove every link attached to a socket; returns how many went away
    pub fn unlink_socket(&mut self, node_id: NodeId, socket_id: SocketId) -> usize {
        let endpoint = Endpoint::new(node_id, socket_id);
        let before = self.links.len();
        self.links.retain(|_, link| !link.touches(endpoint));
        before - self.links.len()
    }

    /// Links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The link feeding an input socket, if any
    pub fn link_into(&self, node_id: NodeId, socket_id: SocketId) -> Option<&Link> {
        let endpoint = Endpoint::new(node_id, socket_id);
        self.links.values().find(|link| link.to == endpoint)
    }

    /// Nodes ordered so every node comes after the nodes feeding it.
    ///
    /// Ties keep insertion order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut pending: HashMap<NodeId, usize> = self.nodes.keys().map(|id| (*id, 0)).collect();
        for link in self.links.values() {
            if let Some(count) = pending.get_mut(&link.to.node) {
                *count += 1;
            }
        }

        let mut ready: VecDeque<NodeId> = self.nodes.keys()
            .filter(|id| pending.get(id) == Some(&0))
            .copied()
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node_id) = ready.pop_front() {
            order.push(node_id);
            for link in self.links.values().filter(|link| link.from.node == node_id) {
                if let Some(count) = pending.get_mut(&link.to.node) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(link.to.node);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(CycleError)
        }
    }

    fn socket(&self, endpoint: Endpoint) -> Result<&Socket, LinkError> {
        self.node(endpoint.node)
            .ok_or(LinkError::NodeNotFound(endpoint.node))?
            .socket(endpoint.socket)
            .ok_or(LinkError::SocketNotFound(endpoint.socket))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("NodeTree")
    }
}

/// Error when linking sockets
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Socket not found on its node
    #[error("Socket not found: {0:?}")]
    SocketNotFound(SocketId),

    /// No socket at the given index
    #[error("No socket at index {0}")]
    NoSocketAt(usize),

    /// Not an output-to-input link of matching kinds
    #[error("Incompatible sockets")]
    IncompatibleSockets,

    /// The input already has a link
    #[error("Input already linked: {0:?}")]
    InputAlreadyLinked(SocketId),

    /// Both ends on one node
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The link would close a cycle
    #[error("Link would create a cycle")]
    WouldCycle,
}

/// The graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;
