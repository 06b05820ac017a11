// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node sockets.
//!
//! Input sockets accept at most one link; output sockets may feed any number
//! of inputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketId(pub Uuid);

impl SocketId {
    /// Create a new random socket ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of a node a socket sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Receives a stage
    Input,
    /// Provides a stage
    Output,
}

/// What a socket carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketKind {
    /// A composed stage
    Stage,
    /// Whatever the other end carries
    Any,
}

impl SocketKind {
    /// Whether values of `self` and `other` can meet on one link
    pub fn accepts(self, other: SocketKind) -> bool {
        self == other || self == Self::Any || other == Self::Any
    }
}

/// A socket on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Socket {
    /// Socket ID, unique across the tree
    pub id: SocketId,
    /// Socket name, e.g. `Input 2`
    pub name: String,
    /// Input or output
    pub direction: SocketDirection,
    /// Carried kind
    pub kind: SocketKind,
}

impl Socket {
    /// Create an input socket
    pub fn input(name: impl Into<String>, kind: SocketKind) -> Self {
        Self::with_direction(name, SocketDirection::Input, kind)
    }

    /// Create an output socket
    pub fn output(name: impl Into<String>, kind: SocketKind) -> Self {
        Self::with_direction(name, SocketDirection::Output, kind)
    }

    fn with_direction(name: impl Into<String>, direction: SocketDirection, kind: SocketKind) -> Self {
        Self {
            id: SocketId::new(),
            name: name.into(),
            direction,
            kind,
        }
    }

    /// Copy of this socket with a fresh ID, for instantiating node types
    pub fn instantiate(&self) -> Self {
        Self {
            id: SocketId::new(),
            ..self.clone()
        }
    }

    /// Whether this socket accepts several links
    pub fn is_multi_link(&self) -> bool {
        self.direction == SocketDirection::Output
    }

    /// Whether a link between `self` and `other` is well formed
    pub fn can_link(&self, other: &Socket) -> bool {
        self.direction != other.direction && self.kind.accepts(other.kind)
    }
}
