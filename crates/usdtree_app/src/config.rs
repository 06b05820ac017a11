// SPDX-License-Identifier: MIT OR Apache-2.0
//! Addon configuration.
//!
//! Stored as RON next to the host file. A missing file means defaults; a
//! file that exists but cannot be read or parsed is an error.

use crate::mirror::COLLECTION_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use usdtree_graph::EngineKind;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "usdtree.ron";

/// Addon settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonConfig {
    /// Log filter directive, e.g. `info` or `usdtree_graph=debug`
    pub logging_level: String,
    /// Root of the scratch stage files; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    /// Name of the viewport mirror collection
    pub collection_name: String,
    /// Engine the tree is evaluated for
    pub engine: EngineKind,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            logging_level: "info".to_string(),
            temp_dir: None,
            collection_name: COLLECTION_NAME.to_string(),
            engine: EngineKind::default(),
        }
    }
}

impl AddonConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `usdtree.ron` from `dir`
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&Self::config_file_path(dir))
    }

    /// Save to `path`
    #[allow(dead_code)] // Intentionally kept for API completeness
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config file path for a directory
    pub fn config_file_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error at {}: {source}", path.display())]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid RON for this config
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ron::error::SpannedError,
    },

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}
