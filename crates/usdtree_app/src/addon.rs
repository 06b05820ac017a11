// SPDX-License-Identifier: MIT OR Apache-2.0
//! Addon lifecycle.
//!
//! Registering the addon sets up the scratch location, the host data and
//! the mirror; unregistering removes the mirror collection and every
//! scratch stage file.

use crate::config::AddonConfig;
use crate::mirror::{SyncError, UsdCollection, LOG_TAG};
use crate::scene::{HostData, SceneId};
use usdtree_graph::{ComputeContext, Engine, Log, LogOnce};
use usdtree_stage::TempPathAllocator;

/// Log tag of node computation
pub const NODES_LOG_TAG: &str = "usd_nodes";

/// A registered addon and the host data it works on
pub struct Addon {
    config: AddonConfig,
    engine: Engine,
    temp: TempPathAllocator,
    log: LogOnce,
    mirror: UsdCollection,
    mirror_log: Log,
    data: HostData,
    scene: SceneId,
}

impl Addon {
    /// Register the addon with a fresh host file holding one scene
    pub fn register(config: AddonConfig) -> Self {
        let temp = match &config.temp_dir {
            Some(dir) => TempPathAllocator::new(dir),
            None => TempPathAllocator::in_system_temp(),
        };
        let engine = Engine::new(config.engine);
        let mirror = UsdCollection::new(config.collection_name.clone());

        let mut data = HostData::new();
        let scene = data.new_scene("Scene");

        tracing::info!(
            "Addon registered: engine {engine}, scratch files in {}",
            temp.root().display()
        );

        Self {
            config,
            engine,
            temp,
            log: LogOnce::tagged(NODES_LOG_TAG),
            mirror,
            mirror_log: Log::new(LOG_TAG),
            data,
            scene,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &AddonConfig {
        &self.config
    }

    /// Host data
    pub fn data(&self) -> &HostData {
        &self.data
    }

    /// Mutable host data
    pub fn data_mut(&mut self) -> &mut HostData {
        &mut self.data
    }

    /// The active scene
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Scratch location for generated stages
    pub fn temp(&self) -> &TempPathAllocator {
        &self.temp
    }

    /// Viewport mirror
    pub fn mirror(&self) -> &UsdCollection {
        &self.mirror
    }

    /// Scene update: mirror the output of `tree_name` into the viewport
    pub fn sync(&mut self, tree_name: Option<&str>) -> Result<(), SyncError> {
        let ctx = ComputeContext::new(&self.engine, &self.temp, &self.log);
        self.mirror.sync(&mut self.data, self.scene, tree_name, ctx, &self.mirror_log)
    }

    /// Unregister: drop the mirror collection and scratch files
    pub fn unregister(mut self) -> usdtree_stage::Result<()> {
        self.mirror.clear(&mut self.data, &self.mirror_log);
        self.log.reset();
        self.temp.clear()?;
        tracing::info!("Addon unregistered");
        Ok(())
    }
}
