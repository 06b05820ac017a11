// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output node: the stage a tree hands to the viewport.

use super::NodeSettings;
use crate::node::{NodeCategory, NodeType};
use crate::socket::{Socket, SocketKind};

/// Name of the output node's only socket, where final computation starts
pub const ENTRY_SOCKET: &str = "Input";

pub(super) fn node_type() -> NodeType {
    NodeType {
        id: super::OUTPUT_NODE.to_string(),
        label: "Output".to_string(),
        category: NodeCategory::Output,
        inputs: vec![Socket::input(ENTRY_SOCKET, SocketKind::Stage)],
        outputs: vec![],
        settings: NodeSettings::Output,
    }
}
