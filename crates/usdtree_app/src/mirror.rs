// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport mirror.
//!
//! Shows the stage a node tree produces as one host collection holding an
//! empty proxy object per top-level prim. Every sync tears the collection
//! down and builds it again from the current stage. Progress goes to the
//! logger handed in by the caller.

use crate::scene::{CollectionId, HostData, ObjectId, SceneId};
use usdtree_graph::nodes::output::ENTRY_SOCKET;
use usdtree_graph::{ComputeContext, ComputeError, Logger};
use usdtree_stage::{Stage, StageRef};

/// Default name of the mirror collection
pub const COLLECTION_NAME: &str = "USD NodeTree";

/// Log tag of the mirror
pub const LOG_TAG: &str = "usd_collection";

/// The mirror collection of one host file
#[derive(Debug, Clone)]
pub struct UsdCollection {
    name: String,
}

impl Default for UsdCollection {
    fn default() -> Self {
        Self::new(COLLECTION_NAME)
    }
}

impl UsdCollection {
    /// Mirror into the collection called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebuild the collection from the output of the node tree `tree_name`.
    ///
    /// With no tree name, or when the tree yields no stage, the collection is
    /// only removed. Node computation logs through `ctx`, the mirror itself
    /// through `log`.
    pub fn sync(
        &self,
        data: &mut HostData,
        scene: SceneId,
        tree_name: Option<&str>,
        ctx: ComputeContext<'_>,
        log: &dyn Logger,
    ) -> Result<(), SyncError> {
        self.clear(data, log);

        let Some(tree_name) = tree_name else {
            return Ok(());
        };
        let Some(stage) = resolve_stage(data, tree_name, ctx)? else {
            return Ok(());
        };

        self.create(data, scene, &stage, log)?;
        Ok(())
    }

    /// Remove the collection and the proxy objects in it.
    ///
    /// Objects the user put in the collection survive, unlinked.
    pub fn clear(&self, data: &mut HostData, log: &dyn Logger) {
        let Some(collection) = data.collection_by_name(&self.name) else {
            return;
        };
        let collection_id = collection.id;

        let owned: Vec<ObjectId> = data
            .collection_objects(collection_id)
            .filter(|object| object.is_usd)
            .map(|object| object.id)
            .collect();
        for object_id in owned {
            data.remove_object(object_id);
        }

        data.remove_collection(collection_id);
        log.debug("Collection removed");
    }

    /// Add a proxy object for each child of the stage's pseudo-root,
    /// creating the collection in `scene` if needed
    pub fn create(
        &self,
        data: &mut HostData,
        scene: SceneId,
        stage: &Stage,
        log: &dyn Logger,
    ) -> Result<CollectionId, SyncError> {
        let collection_id = match data.collection_by_name(&self.name) {
            Some(collection) => collection.id,
            None => {
                if data.scene(scene).is_none() {
                    return Err(SyncError::SceneNotFound(scene));
                }
                let id = data.new_collection(&self.name);
                data.link_collection(scene, id);
                log.info(&format!("Collection created: {}", self.name));
                id
            }
        };

        for child in stage.pseudo_root().children() {
            let object_id = data.new_object(child.path().as_str());
            if let Some(object) = data.object_mut(object_id) {
                object.is_usd = true;
                log.debug(&format!("Object created: {}", object.name));
            }
            data.link_object(collection_id, object_id);
        }

        Ok(collection_id)
    }
}

fn resolve_stage(
    data: &mut HostData,
    tree_name: &str,
    ctx: ComputeContext<'_>,
) -> Result<Option<StageRef>, ComputeError> {
    let Some(tree) = data.node_group_mut(tree_name) else {
        return Ok(None);
    };
    let Some(output_node) = tree.get_output_node() else {
        return Ok(None);
    };

    if let Some(stage) = tree.cached_stage(output_node) {
        return Ok(Some(stage));
    }
    tree.final_compute(output_node, ENTRY_SOCKET, ctx)
}

/// Error during viewport sync
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The scene to link the collection into does not exist
    #[error("Scene not found: {0:?}")]
    SceneNotFound(SceneId),

    /// The node tree failed to compute
    #[error("Failed to compute node tree: {0}")]
    Compute(#[from] ComputeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use usdtree_graph::nodes::{FileSettings, FILE_NODE, MERGE_NODE, OUTPUT_NODE};
    use usdtree_graph::{create_usd_registry, Engine, Log, LogLevel, NodeId, NodeSettings, UsdTree};
    use usdtree_stage::{PrimPath, TempPathAllocator};

    /// Keeps mirror messages for assertions
    #[derive(Default)]
    struct Recorder {
        messages: RefCell<Vec<(LogLevel, String)>>,
    }

    impl Logger for Recorder {
        fn log(&self, level: LogLevel, message: &str) {
            self.messages.borrow_mut().push((level, message.to_string()));
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        temp: TempPathAllocator,
        engine: Engine,
        log: Log,
        mirror_log: Recorder,
        data: HostData,
        scene: SceneId,
        mirror: UsdCollection,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let temp = TempPathAllocator::new(dir.path().join("tmp"));
            let mut data = HostData::new();
            let scene = data.new_scene("Scene");
            Self {
                dir,
                temp,
                engine: Engine::default(),
                log: Log::new("test"),
                mirror_log: Recorder::default(),
                data,
                scene,
                mirror: UsdCollection::default(),
            }
        }

        fn sync(&mut self, tree_name: Option<&str>) -> Result<(), SyncError> {
            let ctx = ComputeContext::new(&self.engine, &self.temp, &self.log);
            self.mirror.sync(&mut self.data, self.scene, tree_name, ctx, &self.mirror_log)
        }

        fn clear(&mut self) {
            self.mirror.clear(&mut self.data, &self.mirror_log);
        }

        fn create(&mut self, scene: SceneId, stage: &Stage) -> Result<CollectionId, SyncError> {
            self.mirror.create(&mut self.data, scene, stage, &self.mirror_log)
        }

        fn logged(&self) -> Vec<(LogLevel, String)> {
            self.mirror_log.messages.borrow().clone()
        }

        fn write_stage(&self, name: &str, prims: &[&str]) -> PathBuf {
            write_stage(self.dir.path(), name, prims)
        }

        fn collection_names(&self) -> Vec<String> {
            let collection = self.data.collection_by_name(COLLECTION_NAME).unwrap();
            self.data
                .collection_objects(collection.id)
                .map(|object| object.name.clone())
                .collect()
        }
    }

    fn write_stage(dir: &Path, name: &str, prims: &[&str]) -> PathBuf {
        let path = dir.join(format!("{name}.usda"));
        let mut stage = Stage::create_new(&path).unwrap();
        for prim in prims {
            stage.define_prim(&PrimPath::new(*prim).unwrap(), "Xform").unwrap();
        }
        stage.save().unwrap();
        path
    }

    fn file_node(tree: &mut UsdTree, path: PathBuf) -> NodeId {
        let mut node = create_usd_registry().create_node(FILE_NODE).unwrap();
        node.settings = NodeSettings::File(FileSettings::new(path));
        tree.add_node(node)
    }

    fn add_node(tree: &mut UsdTree, type_id: &str) -> NodeId {
        tree.add_node(create_usd_registry().create_node(type_id).unwrap())
    }

    /// File node wired straight into an output node
    fn file_tree(name: &str, path: PathBuf) -> UsdTree {
        let mut tree = UsdTree::new(name);
        let file = file_node(&mut tree, path);
        let output = add_node(&mut tree, OUTPUT_NODE);
        tree.link(file, 0, output, 0).unwrap();
        tree
    }

    #[test]
    fn test_sync_mirrors_top_level_prims() {
        let mut fx = Fixture::new();
        let path = fx.write_stage("a", &["/a", "/a/nested", "/b"]);
        fx.data.add_node_group(file_tree("USD", path));

        fx.sync(Some("USD")).unwrap();

        assert_eq!(fx.collection_names(), vec!["/a", "/b"]);
        let collection = fx.data.collection_by_name(COLLECTION_NAME).unwrap();
        assert!(fx.data.collection_objects(collection.id).all(|o| o.is_usd));
        let scene = fx.data.scene(fx.scene).unwrap();
        assert_eq!(scene.collection.children, vec![collection.id]);
    }

    #[test]
    fn test_clear_removes_proxies_and_collection() {
        let mut fx = Fixture::new();
        let path = fx.write_stage("a", &["/a", "/b"]);
        fx.data.add_node_group(file_tree("USD", path));
        fx.sync(Some("USD")).unwrap();

        fx.clear();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());
        assert!(fx.data.object_by_name("/a").is_none());
        assert!(fx.data.object_by_name("/b").is_none());
        assert!(fx.data.scene(fx.scene).unwrap().collection.children.is_empty());

        // Nothing left to clear
        fx.clear();
    }

    #[test]
    fn test_sync_without_tree_removes_collection() {
        let mut fx = Fixture::new();
        fx.sync(None).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());

        let path = fx.write_stage("a", &["/a"]);
        fx.data.add_node_group(file_tree("USD", path));
        fx.sync(Some("USD")).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_some());

        fx.sync(None).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());
        assert_eq!(fx.data.objects().count(), 0);
    }

    #[test]
    fn test_repeated_sync_rebuilds_and_keeps_user_objects() {
        let mut fx = Fixture::new();
        let path = fx.write_stage("a", &["/a", "/b"]);
        fx.data.add_node_group(file_tree("USD", path));
        let outside = fx.data.new_object("Camera");

        fx.sync(Some("USD")).unwrap();
        let first = fx.collection_names();

        let collection = fx.data.collection_by_name(COLLECTION_NAME).unwrap().id;
        let user = fx.data.new_object("Light");
        fx.data.link_object(collection, user);

        fx.sync(Some("USD")).unwrap();
        assert_eq!(fx.collection_names(), first);
        fx.sync(Some("USD")).unwrap();
        assert_eq!(fx.collection_names(), first);

        for id in [outside, user] {
            let object = fx.data.object(id).unwrap();
            assert!(!object.is_usd);
        }
        assert_eq!(fx.data.object(user).unwrap().name, "Light");
        assert_eq!(fx.data.object(outside).unwrap().name, "Camera");
        // Two proxies plus the two user objects
        assert_eq!(fx.data.objects().count(), 4);
    }

    #[test]
    fn test_missing_tree_or_output_is_a_noop() {
        let mut fx = Fixture::new();
        fx.sync(Some("missing")).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());

        let mut tree = UsdTree::new("NoOutput");
        let path = fx.write_stage("a", &["/a"]);
        file_node(&mut tree, path);
        fx.data.add_node_group(tree);
        fx.sync(Some("NoOutput")).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());

        let mut tree = UsdTree::new("Unlinked");
        add_node(&mut tree, OUTPUT_NODE);
        fx.data.add_node_group(tree);
        fx.sync(Some("Unlinked")).unwrap();
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());
    }

    #[test]
    fn test_sync_prefers_cached_stage() {
        let mut fx = Fixture::new();
        let path = fx.write_stage("a", &["/a"]);
        fx.data.add_node_group(file_tree("USD", path.clone()));
        fx.sync(Some("USD")).unwrap();

        // The cached stage is used, so the file is not read again
        std::fs::remove_file(&path).unwrap();
        fx.sync(Some("USD")).unwrap();
        assert_eq!(fx.collection_names(), vec!["/a"]);

        fx.data.node_group_mut("USD").unwrap().reset();
        assert!(matches!(fx.sync(Some("USD")), Err(SyncError::Compute(_))));
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());
    }

    #[test]
    fn test_sync_merged_tree_shows_merge_root() {
        let mut fx = Fixture::new();
        let mut tree = UsdTree::new("USD");
        let a = file_node(&mut tree, fx.write_stage("a", &["/a"]));
        let b = file_node(&mut tree, fx.write_stage("b", &["/b"]));
        let merge = add_node(&mut tree, MERGE_NODE);
        let output = add_node(&mut tree, OUTPUT_NODE);
        tree.link(a, 0, merge, 0).unwrap();
        tree.link(b, 0, merge, 1).unwrap();
        tree.link(merge, 0, output, 0).unwrap();
        fx.data.add_node_group(tree);

        fx.sync(Some("USD")).unwrap();
        assert_eq!(fx.collection_names(), vec!["/merge"]);
    }

    #[test]
    fn test_create_needs_an_existing_scene() {
        let mut fx = Fixture::new();
        let stage = Stage::open(fx.write_stage("a", &["/a"])).unwrap();
        let result = fx.create(SceneId::new(), &stage);
        assert!(matches!(result, Err(SyncError::SceneNotFound(_))));
        assert!(fx.data.collection_by_name(COLLECTION_NAME).is_none());
    }

    #[test]
    fn test_proxy_names_follow_host_uniquing() {
        let mut fx = Fixture::new();
        fx.data.new_object("/a");
        let stage = Stage::open(fx.write_stage("a", &["/a"])).unwrap();
        let scene = fx.scene;
        fx.create(scene, &stage).unwrap();
        assert_eq!(fx.collection_names(), vec!["/a.001"]);
    }

    #[test]
    fn test_sync_logs_through_injected_logger() {
        let mut fx = Fixture::new();
        let path = fx.write_stage("a", &["/a", "/b"]);
        fx.data.add_node_group(file_tree("USD", path));

        fx.sync(Some("USD")).unwrap();
        assert_eq!(
            fx.logged(),
            vec![
                (LogLevel::Info, format!("Collection created: {COLLECTION_NAME}")),
                (LogLevel::Debug, "Object created: /a".to_string()),
                (LogLevel::Debug, "Object created: /b".to_string()),
            ]
        );

        fx.sync(None).unwrap();
        assert_eq!(
            fx.logged().last(),
            Some(&(LogLevel::Debug, "Collection removed".to_string()))
        );
    }
}
