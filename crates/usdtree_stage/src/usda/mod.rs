// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `usda` text format.
//!
//! Only the parts of the format the stage model represents are read: layer
//! metadata, prim specs and reference arcs. Properties and any metadata the
//! model does not know about are skipped.

mod reader;
mod token;
mod writer;

pub use reader::{read_layer, Parser};
pub use token::Token;
pub use writer::write_layer;

/// Header line every usda file starts with
pub const USDA_HEADER: &str = "#usda 1.0";
