// SPDX-License-Identifier: MIT OR Apache-2.0
//! File node: opens a stage from a usda file.

use super::NodeSettings;
use crate::evaluation::{ComputeContext, ComputeError};
use crate::node::{NodeCategory, NodeType};
use crate::socket::{Socket, SocketKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use usdtree_stage::{Stage, StageRef};

/// File node configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Stage file to open
    pub path: Option<PathBuf>,
}

impl FileSettings {
    /// Settings pointing at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

pub(super) fn node_type() -> NodeType {
    NodeType {
        id: super::FILE_NODE.to_string(),
        label: "USD File".to_string(),
        category: NodeCategory::Input,
        inputs: vec![],
        outputs: vec![Socket::output("Output", SocketKind::Stage)],
        settings: NodeSettings::File(FileSettings::default()),
    }
}

/// Open the configured stage; no file configured means no output
pub fn compute(
    settings: &FileSettings,
    ctx: &ComputeContext<'_>,
) -> Result<Option<StageRef>, ComputeError> {
    let Some(path) = &settings.path else {
        ctx.log.debug("UsdFileNode: no file set");
        return Ok(None);
    };

    let stage = Stage::open(path)?;
    ctx.log.debug(&format!("UsdFileNode: opened {}", path.display()));
    Ok(Some(Arc::new(stage)))
}
