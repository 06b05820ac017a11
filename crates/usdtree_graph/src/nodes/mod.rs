// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node types of the USD tree.

pub mod file;
pub mod merge;
pub mod output;

use crate::node::NodeRegistry;
use serde::{Deserialize, Serialize};

pub use file::FileSettings;
pub use merge::MergeSettings;

/// Type ID of the file node
pub const FILE_NODE: &str = "usd.UsdFileNode";
/// Type ID of the merge node
pub const MERGE_NODE: &str = "usd.MergeNode";
/// Type ID of the output node
pub const OUTPUT_NODE: &str = "usd.OutputNode";

/// Per-type node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeSettings {
    /// Stage loaded from a file
    File(FileSettings),
    /// Several stages composed by reference
    Merge(MergeSettings),
    /// Designated tree output
    Output,
}

/// Create the USD tree node registry
pub fn create_usd_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(file::node_type());
    registry.register(merge::node_type());
    registry.register(output::node_type());
    registry
}
