// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links between sockets.

use crate::node::NodeId;
use crate::socket::SocketId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Node owning the socket
    pub node: NodeId,
    /// The socket
    pub socket: SocketId,
}

impl Endpoint {
    /// Endpoint at `socket` of `node`
    pub fn new(node: NodeId, socket: SocketId) -> Self {
        Self { node, socket }
    }
}

/// A link carrying a stage from an output socket to an input socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Link ID
    pub id: LinkId,
    /// Output side
    pub from: Endpoint,
    /// Input side
    pub to: Endpoint,
}

impl Link {
    /// Create a link
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self {
            id: LinkId::new(),
            from,
            to,
        }
    }

    /// Whether either end sits on `node`
    pub fn touches_node(&self, node: NodeId) -> bool {
        self.from.node == node || self.to.node == node
    }

    /// Whether either end is `endpoint`
    pub fn touches(&self, endpoint: Endpoint) -> bool {
        self.from == endpoint || self.to == endpoint
    }
}
