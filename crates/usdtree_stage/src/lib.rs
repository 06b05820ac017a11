// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage model for the USD node tree.
//!
//! This crate provides the small slice of scene description the node tree
//! needs:
//! - Stages with a file-backed (or anonymous) root layer
//! - Prim specs with specifiers, type names and reference arcs
//! - Reading and writing the `usda` text format
//! - Deterministic scratch locations for generated stages
//!
//! Reference arcs are stored as authored; resolving them is left to whoever
//! opens the referenced layers.

pub mod error;
pub mod layer;
pub mod path;
pub mod prim;
pub mod stage;
pub mod temp;
pub mod usda;

pub use error::{Result, StageError};
pub use layer::{Layer, UpAxis};
pub use path::PrimPath;
pub use prim::{Prim, PrimSpec, Reference, Specifier};
pub use stage::{Stage, StageRef};
pub use temp::TempPathAllocator;
