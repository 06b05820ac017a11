// SPDX-License-Identifier: MIT OR Apache-2.0
//! USD node tree: a named graph plus the stages its nodes last produced.
//!
//! Every structural edit made through the tree drops the cache, so a cached
//! stage always matches the current graph.

use crate::evaluation::{ComputeContext, ComputeError, Evaluator, StageCache};
use crate::graph::{Graph, LinkError};
use crate::link::LinkId;
use crate::node::{Node, NodeId};
use crate::nodes::{merge, NodeSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use usdtree_stage::StageRef;

/// A node tree that computes stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsdTree {
    graph: Graph,
    #[serde(skip)]
    cache: StageCache,
}

impl UsdTree {
    /// Create a new empty tree
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(name),
            cache: StageCache::new(),
        }
    }

    /// Tree name
    pub fn name(&self) -> &str {
        &self.graph.name
    }

    /// Read access to the graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Write access to the graph; drops cached stages
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.reset();
        &mut self.graph
    }

    /// Add a node
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph_mut().add_node(node)
    }

    /// Link output `output_index` of `from` to input `input_index` of `to`
    pub fn link(
        &mut self,
        from: NodeId,
        output_index: usize,
        to: NodeId,
        input_index: usize,
    ) -> Result<LinkId, LinkError> {
        self.graph_mut().link(from, output_index, to, input_index)
    }

    /// Set a merge node's `inputs_number`, reconciling its sockets and
    /// dropping links to removed ones
    pub fn set_inputs_number(
        &mut self,
        node_id: NodeId,
        inputs_number: u32,
    ) -> Result<(), ComputeError> {
        let graph = self.graph_mut();
        let node = graph.node_mut(node_id)
            .ok_or(ComputeError::NodeNotFound(node_id))?;
        let removed = merge::set_inputs_number(node, inputs_number);
        for socket in removed {
            graph.unlink_socket(node_id, socket);
        }
        Ok(())
    }

    /// Point a file node at `path`
    pub fn set_file_path(
        &mut self,
        node_id: NodeId,
        path: Option<PathBuf>,
    ) -> Result<(), ComputeError> {
        let node = self.graph_mut().node_mut(node_id)
            .ok_or(ComputeError::NodeNotFound(node_id))?;
        if let NodeSettings::File(settings) = &mut node.settings {
            settings.path = path;
        }
        Ok(())
    }

    /// The designated output node, if the tree has one
    pub fn get_output_node(&self) -> Option<NodeId> {
        self.graph.nodes()
            .find(|n| n.is_output_node())
            .map(|n| n.id)
    }

    /// Stage a node produced the last time it was computed
    pub fn cached_stage(&self, node_id: NodeId) -> Option<StageRef> {
        self.cache.stage(node_id)
    }

    /// Compute the stage a node produces
    pub fn compute(
        &mut self,
        node_id: NodeId,
        ctx: ComputeContext<'_>,
    ) -> Result<Option<StageRef>, ComputeError> {
        Evaluator::new(&self.graph, &mut self.cache, ctx)?.compute(node_id)
    }

    /// Compute the stage arriving at input socket `index` of a node
    pub fn get_input_link(
        &mut self,
        node_id: NodeId,
        index: usize,
        ctx: ComputeContext<'_>,
    ) -> Result<Option<StageRef>, ComputeError> {
        Evaluator::new(&self.graph, &mut self.cache, ctx)?.get_input_link(node_id, index)
    }

    /// Full recompute starting from the input socket named `entry_socket`.
    ///
    /// Everything cached is discarded first; the result becomes the node's
    /// cached stage.
    pub fn final_compute(
        &mut self,
        node_id: NodeId,
        entry_socket: &str,
        ctx: ComputeContext<'_>,
    ) -> Result<Option<StageRef>, ComputeError> {
        self.reset();
        let stage = Evaluator::new(&self.graph, &mut self.cache, ctx)?
            .get_input_link_by_name(node_id, entry_socket)?;
        self.cache.insert(node_id, stage.clone());
        ctx.log.debug(&format!(
            "Final compute of {:?} from {entry_socket:?}: {}",
            self.name(),
            if stage.is_some() { "stage" } else { "no stage" }
        ));
        Ok(stage)
    }

    /// Drop every cached stage
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Serialize the graph to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Load a tree from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Engine;
    use crate::log::testing::RecordingLogger;
    use crate::nodes::output::ENTRY_SOCKET;
    use crate::nodes::{create_usd_registry, FileSettings, FILE_NODE, MERGE_NODE, OUTPUT_NODE};
    use std::sync::Arc;
    use usdtree_stage::{PrimPath, Stage, TempPathAllocator};

    struct Fixture {
        dir: tempfile::TempDir,
        temp: TempPathAllocator,
        engine: Engine,
        log: RecordingLogger,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let temp = TempPathAllocator::new(dir.path().join("tmp"));
            Self {
                dir,
                temp,
                engine: Engine::default(),
                log: RecordingLogger::default(),
            }
        }

        fn ctx(&self) -> ComputeContext<'_> {
            ComputeContext::new(&self.engine, &self.temp, &self.log)
        }

        fn write_stage(&self, name: &str, children: &[&str]) -> PathBuf {
            let path = self.dir.path().join(format!("{name}.usda"));
            let mut stage = Stage::create_new(&path).unwrap();
            for child in children {
                stage.define_prim(&PrimPath::new(*child).unwrap(), "Xform").unwrap();
            }
            stage.save().unwrap();
            path
        }
    }

    fn file_node(tree: &mut UsdTree, path: PathBuf) -> NodeId {
        let mut node = create_usd_registry().create_node(FILE_NODE).unwrap();
        node.settings = NodeSettings::File(FileSettings::new(path));
        tree.add_node(node)
    }

    fn node(tree: &mut UsdTree, type_id: &str) -> NodeId {
        tree.add_node(create_usd_registry().create_node(type_id).unwrap())
    }

    #[test]
    fn test_output_node_lookup() {
        let mut tree = UsdTree::new("Tree");
        assert!(tree.get_output_node().is_none());
        node(&mut tree, MERGE_NODE);
        let out = node(&mut tree, OUTPUT_NODE);
        assert_eq!(tree.get_output_node(), Some(out));
    }

    #[test]
    fn test_final_compute_through_merge() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let a = file_node(&mut tree, fx.write_stage("a", &["/a"]));
        let b = file_node(&mut tree, fx.write_stage("b", &["/b"]));
        let merge = node(&mut tree, MERGE_NODE);
        let out = node(&mut tree, OUTPUT_NODE);
        tree.link(a, 0, merge, 0).unwrap();
        tree.link(b, 0, merge, 1).unwrap();
        tree.link(merge, 0, out, 0).unwrap();

        assert!(tree.cached_stage(out).is_none());
        let stage = tree.final_compute(out, ENTRY_SOCKET, fx.ctx()).unwrap().unwrap();
        assert_eq!(stage.default_prim().unwrap().children().len(), 2);

        let cached = tree.cached_stage(out).unwrap();
        assert!(Arc::ptr_eq(&cached, &stage));
        assert!(Arc::ptr_eq(&tree.cached_stage(merge).unwrap(), &stage));
    }

    #[test]
    fn test_single_input_passes_file_stage_through() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let a = file_node(&mut tree, fx.write_stage("a", &["/a"]));
        let merge = node(&mut tree, MERGE_NODE);
        tree.link(a, 0, merge, 1).unwrap();

        let merged = tree.compute(merge, fx.ctx()).unwrap().unwrap();
        let source = tree.cached_stage(a).unwrap();
        assert!(Arc::ptr_eq(&merged, &source));
    }

    #[test]
    fn test_unconnected_output_yields_nothing() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let out = node(&mut tree, OUTPUT_NODE);
        assert!(tree.final_compute(out, ENTRY_SOCKET, fx.ctx()).unwrap().is_none());
        assert!(matches!(
            tree.final_compute(out, "Missing", fx.ctx()),
            Err(ComputeError::SocketNotFound(_))
        ));
    }

    #[test]
    fn test_shrinking_inputs_drops_links() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let a = file_node(&mut tree, fx.write_stage("a", &["/a"]));
        let b = file_node(&mut tree, fx.write_stage("b", &["/b"]));
        let merge = node(&mut tree, MERGE_NODE);
        tree.set_inputs_number(merge, 5).unwrap();
        tree.link(a, 0, merge, 0).unwrap();
        tree.link(b, 0, merge, 4).unwrap();
        assert_eq!(tree.graph().link_count(), 2);

        tree.set_inputs_number(merge, 2).unwrap();
        assert_eq!(tree.graph().node(merge).unwrap().inputs.len(), 2);
        assert_eq!(tree.graph().link_count(), 1);

        // Only `a` is left, so the merge passes it through
        let merged = tree.compute(merge, fx.ctx()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&merged, &tree.cached_stage(a).unwrap()));
    }

    #[test]
    fn test_edits_invalidate_cache() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let a = file_node(&mut tree, fx.write_stage("a", &["/a"]));
        tree.compute(a, fx.ctx()).unwrap();
        assert!(tree.cached_stage(a).is_some());

        tree.set_file_path(a, None).unwrap();
        assert!(tree.cached_stage(a).is_none());
        assert!(tree.compute(a, fx.ctx()).unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let fx = Fixture::new();
        let mut tree = UsdTree::new("Tree");
        let a = file_node(&mut tree, fx.dir.path().join("missing.usda"));
        assert!(matches!(tree.compute(a, fx.ctx()), Err(ComputeError::Stage(_))));
    }

    #[test]
    fn test_ron_round_trip_keeps_structure() {
        let mut tree = UsdTree::new("Tree");
        let merge = node(&mut tree, MERGE_NODE);
        let out = node(&mut tree, OUTPUT_NODE);
        tree.set_inputs_number(merge, 3).unwrap();
        tree.link(merge, 0, out, 0).unwrap();

        let loaded = UsdTree::from_ron(&tree.to_ron().unwrap()).unwrap();
        assert_eq!(loaded.name(), "Tree");
        assert_eq!(loaded.graph().node(merge).unwrap().inputs.len(), 3);
        assert_eq!(loaded.graph().link_count(), 1);
        assert_eq!(loaded.get_output_node(), Some(out));
    }
}
