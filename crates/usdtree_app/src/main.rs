// SPDX-License-Identifier: MIT OR Apache-2.0
//! USD node tree host.
//!
//! Runs the node tree outside a content-creation application:
//! - Host data (objects, collections, scenes, node groups)
//! - Viewport mirror of a tree's output stage
//! - RON configuration and addon lifecycle
//!
//! ## Architecture
//!
//! The binary loads `usdtree.ron` from the working directory, registers the
//! addon, builds a small file/merge/output tree over generated stages and
//! mirrors its output, then unregisters.

mod addon;
mod config;
mod mirror;
mod scene;

use addon::Addon;
use config::{AddonConfig, ConfigError};
use mirror::SyncError;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use usdtree_graph::nodes::{FileSettings, FILE_NODE, MERGE_NODE, OUTPUT_NODE};
use usdtree_graph::{create_usd_registry, ComputeError, LinkError, NodeSettings, UsdTree};
use usdtree_stage::{PrimPath, Stage, StageError};

/// Name of the demo node group
const DEMO_TREE: &str = "USD";

/// Error running the host
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("Failed to serialize node tree: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Failed to load node tree: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
    #[error("Unknown node type: {0}")]
    UnknownNodeType(&'static str),
}

fn main() {
    let cwd = std::env::current_dir().unwrap_or_default();
    let config = match AddonConfig::load_from_dir(&cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting usdtree v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config) {
        tracing::error!("usdtree failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: AddonConfig) -> Result<(), AppError> {
    let mut addon = Addon::register(config);
    tracing::info!("Evaluating for the {} engine", addon.config().engine);

    let tree = build_demo_tree(&addon.temp().root().join("sources"))?;
    let tree_name = addon.data_mut().add_node_group(tree);

    addon.sync(Some(&tree_name))?;
    report(&addon);

    if let Some(tree) = addon.data().node_group(&tree_name) {
        let saved = tree.to_ron()?;
        let loaded = UsdTree::from_ron(&saved)?;
        tracing::info!(
            "Node tree {} round-trips through RON: {} nodes, {} links",
            loaded.name(),
            loaded.graph().node_count(),
            loaded.graph().link_count()
        );
    }

    // A scene update with no active tree drops the mirror
    addon.sync(None)?;
    report(&addon);

    addon.unregister()?;
    Ok(())
}

/// Three file nodes merged into the output
fn build_demo_tree(dir: &Path) -> Result<UsdTree, AppError> {
    let registry = create_usd_registry();
    let create = |type_id: &'static str| {
        registry
            .create_node(type_id)
            .ok_or(AppError::UnknownNodeType(type_id))
    };

    let mut tree = UsdTree::new(DEMO_TREE);
    let merge = tree.add_node(create(MERGE_NODE)?);
    let output = tree.add_node(create(OUTPUT_NODE)?);
    tree.set_inputs_number(merge, 3)?;
    tree.link(merge, 0, output, 0)?;

    let sources: [(&str, &[&str]); 3] = [
        ("props", &["/chair", "/table"]),
        ("lights", &["/key"]),
        ("set", &["/floor", "/floor/tiles"]),
    ];
    for (index, (name, prims)) in sources.into_iter().enumerate() {
        let path = dir.join(format!("{name}.usda"));
        let mut stage = Stage::create_new(&path)?;
        for prim in prims {
            stage.define_prim(&PrimPath::new(*prim)?, "Xform")?;
        }
        stage.save()?;

        let mut node = create(FILE_NODE)?.with_name(name);
        node.settings = NodeSettings::File(FileSettings::new(path));
        let file = tree.add_node(node);
        tree.link(file, 0, merge, index)?;
    }

    Ok(tree)
}

fn report(addon: &Addon) {
    let data = addon.data();
    if let Some(scene) = data.scene(addon.scene()) {
        tracing::info!("Scene {} links {} collections", scene.name, scene.collection.children.len());
    }
    match data.collection_by_name(addon.mirror().name()) {
        Some(collection) => {
            for object in data.collection_objects(collection.id) {
                tracing::info!("{} holds {} (is_usd: {})", collection.name, object.name, object.is_usd);
            }
        }
        None => tracing::info!(
            "No mirror collection; {} collections, {} objects",
            data.collections().count(),
            data.objects().count()
        ),
    }
}
