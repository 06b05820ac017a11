// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scratch locations for generated stages.
//!
//! Paths are deterministic per (node, engine) pair so recomputing a node
//! overwrites its previous file instead of leaking a new one. Each engine
//! context gets its own subdirectory, so two engines evaluating the same node
//! never write the same file.

use crate::error::{Result, StageError};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Extension of generated stage files
pub const TEMP_STAGE_EXTENSION: &str = "usda";

/// Hands out scratch file paths below a single root directory
#[derive(Debug, Clone)]
pub struct TempPathAllocator {
    root: PathBuf,
}

impl TempPathAllocator {
    /// Use `root` as the scratch directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scratch directory under the system temp dir, unique to this process
    pub fn in_system_temp() -> Self {
        Self::new(std::env::temp_dir().join(format!("usdtree-{}", std::process::id())))
    }

    /// The scratch root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the scratch stage for `node` evaluated by `engine`
    pub fn path_for(&self, node: impl Display, engine: impl Display) -> PathBuf {
        self.root
            .join(engine.to_string())
            .join(format!("{node}.{TEMP_STAGE_EXTENSION}"))
    }

    /// Remove every scratch file
    pub fn clear(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(&self.root).map_err(|e| StageError::io(&self.root, e))?;
        tracing::debug!("Removed temp directory {:?}", self.root);
        Ok(())
    }
}
