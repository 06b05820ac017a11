// SPDX-License-Identifier: MIT OR Apache-2.0
//! usda writer.

use super::USDA_HEADER;
use crate::layer::Layer;
use crate::prim::{PrimSpec, Reference};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Serialize a layer to usda text
pub fn write_layer(layer: &Layer) -> String {
    let mut out = String::new();
    out.push_str(USDA_HEADER);
    out.push('\n');

    let mut metadata = Vec::new();
    if let Some(default_prim) = &layer.default_prim {
        metadata.push(format!("defaultPrim = \"{}\"", escape(default_prim)));
    }
    if let Some(doc) = &layer.doc {
        metadata.push(format!("doc = \"{}\"", escape(doc)));
    }
    if let Some(meters_per_unit) = layer.meters_per_unit {
        metadata.push(format!("metersPerUnit = {meters_per_unit}"));
    }
    if let Some(up_axis) = layer.up_axis {
        metadata.push(format!("upAxis = \"{up_axis}\""));
    }

    if !metadata.is_empty() {
        out.push_str("(\n");
        for line in metadata {
            let _ = writeln!(out, "{INDENT}{line}");
        }
        out.push_str(")\n");
    }

    for (name, spec) in layer.root_prims() {
        out.push('\n');
        write_prim(&mut out, name, spec, 0);
    }

    out
}

fn write_prim(out: &mut String, name: &str, spec: &PrimSpec, depth: usize) {
    let pad = INDENT.repeat(depth);

    let _ = write!(out, "{pad}{}", spec.specifier);
    if let Some(type_name) = &spec.type_name {
        let _ = write!(out, " {type_name}");
    }
    let _ = write!(out, " \"{name}\"");

    if spec.references.is_empty() {
        out.push('\n');
    } else {
        let _ = writeln!(
            out,
            " (\n{pad}{INDENT}prepend references = {}\n{pad})",
            format_references(&spec.references)
        );
    }

    let _ = writeln!(out, "{pad}{{");
    let mut first = true;
    for (child_name, child) in &spec.children {
        if !first {
            out.push('\n');
        }
        first = false;
        write_prim(out, child_name, child, depth + 1);
    }
    let _ = writeln!(out, "{pad}}}");
}

fn format_references(references: &[Reference]) -> String {
    let items: Vec<String> = references.iter().map(format_reference).collect();
    if items.len() == 1 {
        items.into_iter().next().unwrap_or_default()
    } else {
        format!("[{}]", items.join(", "))
    }
}

fn format_reference(reference: &Reference) -> String {
    let asset_path = format_asset_path(&reference.asset_path);
    match &reference.prim_path {
        Some(path) => format!("{asset_path}<{path}>"),
        None => asset_path,
    }
}

fn format_asset_path(path: &str) -> String {
    if path.contains('@') {
        format!("@@@{path}@@@")
    } else {
        format!("@{path}@")
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
