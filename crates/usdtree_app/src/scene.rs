// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host scene data.
//!
//! Objects, collections, scenes and node groups live in one registry, each
//! addressed by ID or by a unique name. Datablock names follow the host
//! convention: asking for a taken name yields `name.001`, `name.002`, ...

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use usdtree_graph::UsdTree;
use uuid::Uuid;

/// Unique identifier for objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    /// Create a new random collection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// An object without geometry data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    /// Object ID
    pub id: ObjectId,
    /// Unique object name
    pub name: String,
    /// Created by the viewport mirror rather than the user
    pub is_usd: bool,
}

/// A named group of objects and child collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    /// Collection ID
    pub id: CollectionId,
    /// Unique collection name
    pub name: String,
    /// Linked objects, in link order
    pub objects: Vec<ObjectId>,
    /// Linked child collections
    pub children: Vec<CollectionId>,
}

impl Collection {
    fn new(name: String) -> Self {
        Self {
            id: CollectionId::new(),
            name,
            objects: Vec::new(),
            children: Vec::new(),
        }
    }

    fn unlink_object(&mut self, object_id: ObjectId) {
        self.objects.retain(|id| *id != object_id);
    }

    fn unlink_child(&mut self, collection_id: CollectionId) {
        self.children.retain(|id| *id != collection_id);
    }
}

/// A scene and its root collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene ID
    #[allow(dead_code)] // Intentionally kept for API completeness
    pub id: SceneId,
    /// Scene name
    pub name: String,
    /// Root collection; not part of the collection registry
    pub collection: Collection,
}

/// Registry of everything in the host file
#[derive(Debug, Default)]
pub struct HostData {
    objects: IndexMap<ObjectId, Object>,
    collections: IndexMap<CollectionId, Collection>,
    scenes: IndexMap<SceneId, Scene>,
    node_groups: IndexMap<String, UsdTree>,
}

impl HostData {
    /// Create empty host data
    pub fn new() -> Self {
        Self::default()
    }

    // Objects

    /// Create an object; the name is made unique
    pub fn new_object(&mut self, name: &str) -> ObjectId {
        let name = unique_name(name, |n| self.object_by_name(n).is_some());
        let id = ObjectId::new();
        self.objects.insert(id, Object { id, name, is_usd: false });
        id
    }

    /// Get an object
    #[allow(dead_code)] // Intentionally kept for API completeness
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Get a mutable object
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Find an object by name
    pub fn object_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.values().find(|o| o.name == name)
    }

    /// All objects, in creation order
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Remove an object, unlinking it everywhere
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        let object = self.objects.shift_remove(&id)?;
        for collection in self.collections.values_mut() {
            collection.unlink_object(id);
        }
        for scene in self.scenes.values_mut() {
            scene.collection.unlink_object(id);
        }
        Some(object)
    }

    // Collections

    /// Create an unlinked collection; the name is made unique
    pub fn new_collection(&mut self, name: &str) -> CollectionId {
        let name = unique_name(name, |n| self.collection_by_name(n).is_some());
        let collection = Collection::new(name);
        let id = collection.id;
        self.collections.insert(id, collection);
        id
    }

    /// Get a collection
    #[allow(dead_code)] // Intentionally kept for API completeness
    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(&id)
    }

    /// Find a collection by name
    pub fn collection_by_name(&self, name: &str) -> Option<&Collection> {
        self.collections.values().find(|c| c.name == name)
    }

    /// All collections
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// Remove a collection, unlinking it from scenes and parents.
    ///
    /// Objects it held stay in the registry.
    pub fn remove_collection(&mut self, id: CollectionId) -> Option<Collection> {
        let collection = self.collections.shift_remove(&id)?;
        for parent in self.collections.values_mut() {
            parent.unlink_child(id);
        }
        for scene in self.scenes.values_mut() {
            scene.collection.unlink_child(id);
        }
        Some(collection)
    }

    /// Link an object into a collection; false when either is missing
    pub fn link_object(&mut self, collection_id: CollectionId, object_id: ObjectId) -> bool {
        if !self.objects.contains_key(&object_id) {
            return false;
        }
        let Some(collection) = self.collections.get_mut(&collection_id) else {
            return false;
        };
        if !collection.objects.contains(&object_id) {
            collection.objects.push(object_id);
        }
        true
    }

    /// Objects linked into a collection
    pub fn collection_objects(&self, id: CollectionId) -> impl Iterator<Item = &Object> {
        self.collections
            .get(&id)
            .into_iter()
            .flat_map(|c| c.objects.iter())
            .filter_map(move |object_id| self.objects.get(object_id))
    }

    // Scenes

    /// Create a scene with an empty root collection
    pub fn new_scene(&mut self, name: &str) -> SceneId {
        let id = SceneId::new();
        let collection = Collection::new(format!("{name} Collection"));
        self.scenes.insert(id, Scene { id, name: name.to_string(), collection });
        id
    }

    /// Get a scene
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    /// Link a collection into a scene's root collection
    pub fn link_collection(&mut self, scene_id: SceneId, collection_id: CollectionId) -> bool {
        if !self.collections.contains_key(&collection_id) {
            return false;
        }
        let Some(scene) = self.scenes.get_mut(&scene_id) else {
            return false;
        };
        if !scene.collection.children.contains(&collection_id) {
            scene.collection.children.push(collection_id);
        }
        true
    }

    // Node groups

    /// Add a node tree under its own name, made unique. Returns the final name.
    pub fn add_node_group(&mut self, tree: UsdTree) -> String {
        let name = unique_name(tree.name(), |n| self.node_groups.contains_key(n));
        self.node_groups.insert(name.clone(), tree);
        name
    }

    /// Get a node tree by name
    pub fn node_group(&self, name: &str) -> Option<&UsdTree> {
        self.node_groups.get(name)
    }

    /// Get a mutable node tree by name
    pub fn node_group_mut(&mut self, name: &str) -> Option<&mut UsdTree> {
        self.node_groups.get_mut(name)
    }
}

/// `base` if free, otherwise the first free `base.NNN`
fn unique_name(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    let mut index = 1u32;
    loop {
        let candidate = format!("{base}.{index:03}");
        if !is_taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let mut data = HostData::new();
        let a = data.new_object("/a");
        let b = data.new_object("/a");
        let c = data.new_object("/a");
        assert_eq!(data.object(a).unwrap().name, "/a");
        assert_eq!(data.object(b).unwrap().name, "/a.001");
        assert_eq!(data.object(c).unwrap().name, "/a.002");

        data.new_collection("USD NodeTree");
        let second = data.new_collection("USD NodeTree");
        assert_eq!(data.collection(second).unwrap().name, "USD NodeTree.001");
    }

    #[test]
    fn test_removed_name_is_reused() {
        let mut data = HostData::new();
        let a = data.new_object("cube");
        data.remove_object(a);
        let b = data.new_object("cube");
        assert_eq!(data.object(b).unwrap().name, "cube");
    }

    #[test]
    fn test_remove_object_unlinks_it() {
        let mut data = HostData::new();
        let collection = data.new_collection("c");
        let object = data.new_object("o");
        assert!(data.link_object(collection, object));
        assert!(data.link_object(collection, object));
        assert_eq!(data.collection(collection).unwrap().objects.len(), 1);

        data.remove_object(object);
        assert!(data.collection(collection).unwrap().objects.is_empty());
        assert_eq!(data.collection_objects(collection).count(), 0);
    }

    #[test]
    fn test_remove_collection_unlinks_from_scene_and_keeps_objects() {
        let mut data = HostData::new();
        let scene = data.new_scene("Scene");
        let collection = data.new_collection("c");
        let object = data.new_object("o");
        data.link_object(collection, object);
        assert!(data.link_collection(scene, collection));

        data.remove_collection(collection);
        assert!(data.scene(scene).unwrap().collection.children.is_empty());
        assert!(data.collection_by_name("c").is_none());
        assert!(data.object(object).is_some());
    }

    #[test]
    fn test_linking_missing_items_fails() {
        let mut data = HostData::new();
        let scene = data.new_scene("Scene");
        let collection = data.new_collection("c");
        assert!(!data.link_object(collection, ObjectId::new()));
        assert!(!data.link_collection(scene, CollectionId::new()));
        assert!(!data.link_collection(SceneId::new(), collection));
    }

    #[test]
    fn test_node_groups_by_name() {
        let mut data = HostData::new();
        assert_eq!(data.add_node_group(UsdTree::new("USD")), "USD");
        assert_eq!(data.add_node_group(UsdTree::new("USD")), "USD.001");
        assert!(data.node_group("USD.001").is_some());
        assert!(data.node_group_mut("USD").is_some());
        assert!(data.node_group("USD.002").is_none());
    }
}
