// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node tree that builds USD stages.
//!
//! A tree is a graph of typed nodes:
//! - File nodes open a stage from disk
//! - Merge nodes compose several stages by reference
//! - An output node marks what the tree produces
//!
//! ## Architecture
//!
//! Evaluation pulls stages from the output node upstream, caching each
//! node's result until the tree is edited. Computation receives its engine,
//! scratch location and log sink through a [`ComputeContext`].

pub mod node;
pub mod socket;
pub mod link;
pub mod graph;
pub mod evaluation;
pub mod log;
pub mod nodes;
pub mod tree;

pub use node::{Node, NodeId, NodeRegistry, NodeType};
pub use socket::{Socket, SocketDirection, SocketId, SocketKind};
pub use link::{Endpoint, Link, LinkId};
pub use graph::{Graph, LinkError};
pub use evaluation::{ComputeContext, ComputeError, Engine, EngineKind};
pub use log::{Log, LogLevel, LogOnce, Logger};
pub use nodes::{create_usd_registry, NodeSettings};
pub use tree::UsdTree;
