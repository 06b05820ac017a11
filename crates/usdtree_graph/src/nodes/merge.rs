// SPDX-License-Identifier: MIT OR Apache-2.0
//! Merge node: composes several upstream stages into one by reference.
//!
//! The merged stage has a single `Xform` root `/merge` (the default prim) with
//! one override child per connected input, `/merge/ref1` .. `/merge/refN`,
//! each referencing the root layer of an upstream stage.

use super::NodeSettings;
use crate::evaluation::{ComputeContext, ComputeError};
use crate::node::{Node, NodeCategory, NodeId, NodeType};
use crate::socket::{Socket, SocketId, SocketKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use usdtree_stage::{PrimPath, Reference, Stage, StageRef, UpAxis};

/// Name of the merged stage's root prim
pub const MERGE_PRIM_NAME: &str = "merge";

/// Merge node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Number of input sockets
    pub inputs_number: u32,
}

impl MergeSettings {
    /// Fewest inputs a merge node can have
    pub const MIN_INPUTS: u32 = 2;
    /// Most inputs a merge node can have
    pub const MAX_INPUTS: u32 = 10;
    /// Inputs of a freshly created merge node
    pub const DEFAULT_INPUTS: u32 = 2;
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            inputs_number: Self::DEFAULT_INPUTS,
        }
    }
}

fn input_socket_name(index: usize) -> String {
    format!("Input {}", index + 1)
}

pub(super) fn node_type() -> NodeType {
    let settings = MergeSettings::default();
    NodeType {
        id: super::MERGE_NODE.to_string(),
        label: "Merge USD".to_string(),
        category: NodeCategory::Composition,
        inputs: (0..settings.inputs_number as usize)
            .map(|i| Socket::input(input_socket_name(i), SocketKind::Stage))
            .collect(),
        outputs: vec![Socket::output("Output", SocketKind::Stage)],
        settings: NodeSettings::Merge(settings),
    }
}

/// Change `inputs_number`, clamped to the allowed range, and reconcile sockets.
///
/// Returns the IDs of removed sockets so their links can be dropped.
pub fn set_inputs_number(node: &mut Node, inputs_number: u32) -> Vec<SocketId> {
    let NodeSettings::Merge(settings) = &mut node.settings else {
        return Vec::new();
    };
    settings.inputs_number =
        inputs_number.clamp(MergeSettings::MIN_INPUTS, MergeSettings::MAX_INPUTS);
    update_inputs_number(node)
}

/// Grow or shrink the input sockets to match `inputs_number`.
///
/// New sockets are appended as `Input {n}`; surplus sockets are removed from
/// the end. Does nothing when the counts already agree.
pub fn update_inputs_number(node: &mut Node) -> Vec<SocketId> {
    let NodeSettings::Merge(settings) = &node.settings else {
        return Vec::new();
    };
    let target = settings.inputs_number as usize;

    let mut removed = Vec::new();
    if node.inputs.len() < target {
        for i in node.inputs.len()..target {
            node.inputs.push(Socket::input(input_socket_name(i), SocketKind::Stage));
        }
    } else {
        while node.inputs.len() > target {
            if let Some(socket) = node.inputs.pop() {
                removed.push(socket.id);
            }
        }
    }
    removed
}

/// Compose `inputs` into a single stage.
///
/// Unconnected inputs are skipped. No stage in means no stage out; a single
/// stage passes through untouched; two or more are referenced from a new
/// stage written to the node's scratch location for this engine.
pub fn merge_stages(
    node_id: NodeId,
    inputs: &[Option<StageRef>],
    ctx: &ComputeContext<'_>,
) -> Result<Option<StageRef>, ComputeError> {
    ctx.log.debug("MergeNode");

    let ref_stages: Vec<&StageRef> = inputs.iter().flatten().collect();
    match ref_stages.as_slice() {
        [] => return Ok(None),
        [single] => return Ok(Some(Arc::clone(single))),
        _ => {}
    }

    let asset_paths = ref_stages
        .iter()
        .map(|stage| {
            let layer = stage.root_layer();
            let path = layer
                .real_path()
                .ok_or_else(|| ComputeError::AnonymousInput(layer.identifier().to_string()))?;
            path.to_str()
                .map(str::to_string)
                .ok_or_else(|| ComputeError::NonUtf8Path(path.to_path_buf()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let path = ctx.usd_temp_path(node_id);
    let mut stage = Stage::create_new(&path)?;
    stage.set_meters_per_unit(1.0);
    stage.set_up_axis(UpAxis::Z);

    let merge_path = PrimPath::abs_root().append_child(MERGE_PRIM_NAME)?;
    stage.define_prim(&merge_path, "Xform")?;
    stage.set_default_prim(&merge_path)?;

    for (i, asset_path) in asset_paths.into_iter().enumerate() {
        let ref_path = merge_path.append_child(&format!("ref{}", i + 1))?;
        stage
            .override_prim(&ref_path)?
            .add_reference(Reference::new(asset_path));
    }

    stage.save()?;
    ctx.log.debug(&format!("MergeNode: wrote {} references to {}", ref_stages.len(), path.display()));

    Ok(Some(Arc::new(stage)))
}
