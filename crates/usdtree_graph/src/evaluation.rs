// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation: pulling stages through the tree.

use crate::graph::Graph;
use crate::log::Logger;
use crate::node::NodeId;
use crate::nodes::{file, merge, NodeSettings};
use crate::socket::SocketId;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use usdtree_stage::{StageError, StageRef, TempPathAllocator};
use uuid::Uuid;

/// What an engine renders for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum EngineKind {
    /// Final (offline) render
    Final,
    /// Interactive viewport
    #[default]
    Viewport,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Final => "final",
            Self::Viewport => "viewport",
        })
    }
}

/// The engine context a tree is evaluated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Engine {
    /// Unique engine instance ID
    pub id: Uuid,
    /// Engine kind
    pub kind: EngineKind,
}

impl Engine {
    /// Create a new engine context
    pub fn new(kind: EngineKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineKind::default())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id.simple())
    }
}

/// Everything a node needs from outside the graph to compute
#[derive(Clone, Copy)]
pub struct ComputeContext<'a> {
    /// Engine context
    pub engine: &'a Engine,
    /// Scratch path allocator
    pub temp: &'a TempPathAllocator,
    /// Log sink
    pub log: &'a dyn Logger,
}

impl<'a> ComputeContext<'a> {
    /// Create a new compute context
    pub fn new(engine: &'a Engine, temp: &'a TempPathAllocator, log: &'a dyn Logger) -> Self {
        Self { engine, temp, log }
    }

    /// Scratch stage path for `node` under this engine
    pub fn usd_temp_path(&self, node: NodeId) -> PathBuf {
        self.temp.path_for(node, self.engine)
    }
}

/// Last computed stage per node. A cached `None` means "computed, no output".
#[derive(Debug, Clone, Default)]
pub struct StageCache {
    stages: HashMap<NodeId, Option<StageRef>>,
}

impl StageCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for a node, if it has been computed
    pub fn get(&self, node_id: NodeId) -> Option<&Option<StageRef>> {
        self.stages.get(&node_id)
    }

    /// Cached stage for a node
    pub fn stage(&self, node_id: NodeId) -> Option<StageRef> {
        self.stages.get(&node_id).cloned().flatten()
    }

    /// Store a result
    pub fn insert(&mut self, node_id: NodeId, stage: Option<StageRef>) {
        self.stages.insert(node_id, stage);
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.stages.clear();
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Pull-based evaluator over one graph
pub struct Evaluator<'a> {
    graph: &'a Graph,
    cache: &'a mut StageCache,
    ctx: ComputeContext<'a>,
}

impl<'a> Evaluator<'a> {
    /// Create a new evaluator, rejecting cyclic graphs
    pub fn new(
        graph: &'a Graph,
        cache: &'a mut StageCache,
        ctx: ComputeContext<'a>,
    ) -> Result<Self, ComputeError> {
        graph.topological_order()
            .map_err(|_| ComputeError::CycleDetected)?;

        Ok(Self { graph, cache, ctx })
    }

    /// Stage produced by a node, computing upstream nodes as needed
    pub fn compute(&mut self, node_id: NodeId) -> Result<Option<StageRef>, ComputeError> {
        if let Some(cached) = self.cache.get(node_id) {
            return Ok(cached.clone());
        }

        let graph = self.graph;
        let node = graph.node(node_id)
            .ok_or(ComputeError::NodeNotFound(node_id))?;

        let stage = match &node.settings {
            NodeSettings::File(settings) => file::compute(settings, &self.ctx)?,
            NodeSettings::Merge(settings) => {
                let inputs = (0..settings.inputs_number as usize)
                    .map(|i| self.get_input_link(node_id, i))
                    .collect::<Result<Vec<_>, _>>()?;
                merge::merge_stages(node_id, &inputs, &self.ctx)?
            }
            NodeSettings::Output => self.get_input_link(node_id, 0)?,
        };

        self.cache.insert(node_id, stage.clone());
        Ok(stage)
    }

    /// Stage arriving at input socket `index`; `None` when unlinked
    pub fn get_input_link(
        &mut self,
        node_id: NodeId,
        index: usize,
    ) -> Result<Option<StageRef>, ComputeError> {
        let graph = self.graph;
        let node = graph.node(node_id)
            .ok_or(ComputeError::NodeNotFound(node_id))?;
        let Some(socket) = node.input(index) else {
            return Ok(None);
        };
        self.compute_link(node_id, socket.id)
    }

    /// Stage arriving at the input socket called `name`
    pub fn get_input_link_by_name(
        &mut self,
        node_id: NodeId,
        name: &str,
    ) -> Result<Option<StageRef>, ComputeError> {
        let graph = self.graph;
        let node = graph.node(node_id)
            .ok_or(ComputeError::NodeNotFound(node_id))?;
        let socket = node.input_named(name)
            .ok_or_else(|| ComputeError::SocketNotFound(name.to_string()))?;
        self.compute_link(node_id, socket.id)
    }

    fn compute_link(
        &mut self,
        node_id: NodeId,
        socket_id: SocketId,
    ) -> Result<Option<StageRef>, ComputeError> {
        let graph = self.graph;
        match graph.link_into(node_id, socket_id) {
            Some(link) => self.compute(link.from.node),
            None => Ok(None),
        }
    }
}

/// Error during evaluation
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// Graph contains a cycle
    #[error("Graph contains a cycle")]
    CycleDetected,

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// No input socket with the given name
    #[error("Socket not found: {0:?}")]
    SocketNotFound(String),

    /// An upstream stage has no file a reference could point at
    #[error("Stage {0} has no file to reference")]
    AnonymousInput(String),

    /// An upstream stage's file path cannot be written as an asset path
    #[error("Stage path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Stage library failure
    #[error(transparent)]
    Stage(#[from] StageError),
}
