// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stages: the handle through which a layer's hierarchy is authored and read.

use crate::error::{Result, StageError};
use crate::layer::{Layer, UpAxis};
use crate::path::PrimPath;
use crate::prim::{Prim, PrimSpec, Specifier};
use std::path::Path;
use std::sync::Arc;

/// Shared handle to a stage. Identity is pointer identity.
pub type StageRef = Arc<Stage>;

/// Fallback linear unit scale when the layer does not author one (centimeters)
pub const FALLBACK_METERS_PER_UNIT: f64 = 0.01;

/// A scene description stage with a single root layer
#[derive(Debug, Clone)]
pub struct Stage {
    root_layer: Layer,
}

impl Stage {
    /// Create a new stage whose root layer lives at `path`.
    ///
    /// The file is written immediately (empty), replacing anything already
    /// there. A relative `path` is resolved against the working directory.
    pub fn create_new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let real_path = std::path::absolute(path).map_err(|e| StageError::io(path, e))?;
        let stage = Self {
            root_layer: Layer::new(real_path),
        };
        stage.save()?;
        Ok(stage)
    }

    /// Create a stage with an anonymous root layer
    pub fn create_in_memory() -> Self {
        Self {
            root_layer: Layer::anonymous(),
        }
    }

    /// Open a stage from a usda file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root_layer = Layer::open(path)?;
        tracing::debug!("Opened stage {}", root_layer.identifier());
        Ok(Self { root_layer })
    }

    /// Wrap an existing layer
    pub fn from_layer(root_layer: Layer) -> Self {
        Self { root_layer }
    }

    /// The root layer
    pub fn root_layer(&self) -> &Layer {
        &self.root_layer
    }

    /// Mutable access to the root layer
    pub fn root_layer_mut(&mut self) -> &mut Layer {
        &mut self.root_layer
    }

    /// Write the root layer to its file
    pub fn save(&self) -> Result<()> {
        self.root_layer.save()
    }

    /// Define a prim of `type_name` at `path`.
    ///
    /// Missing ancestors are defined typeless. An existing spec is promoted to
    /// a definition and retyped.
    pub fn define_prim(&mut self, path: &PrimPath, type_name: &str) -> Result<&mut PrimSpec> {
        let spec = self.root_layer.ensure_prim_spec(path, Specifier::Def)?;
        spec.specifier = Specifier::Def;
        spec.type_name = if type_name.is_empty() {
            None
        } else {
            Some(type_name.to_string())
        };
        Ok(spec)
    }

    /// Author an override at `path`, keeping any existing spec as is
    pub fn override_prim(&mut self, path: &PrimPath) -> Result<&mut PrimSpec> {
        self.root_layer.ensure_prim_spec(path, Specifier::Over)
    }

    /// Nominate a root prim as the default prim
    pub fn set_default_prim(&mut self, path: &PrimPath) -> Result<()> {
        if !path.is_root_prim() {
            return Err(StageError::NotRootPrim(path.clone()));
        }
        if self.root_layer.prim_spec(path).is_none() {
            return Err(StageError::PrimNotFound(path.clone()));
        }
        self.root_layer.default_prim = Some(path.name().to_string());
        Ok(())
    }

    /// The default prim, if one is nominated and exists
    pub fn default_prim(&self) -> Option<Prim<'_>> {
        let name = self.root_layer.default_prim.as_deref()?;
        let path = PrimPath::abs_root().append_child(name).ok()?;
        self.prim_at_path(&path)
    }

    /// Set the linear unit scale
    pub fn set_meters_per_unit(&mut self, meters_per_unit: f64) {
        self.root_layer.meters_per_unit = Some(meters_per_unit);
    }

    /// Linear unit scale, falling back to centimeters
    pub fn meters_per_unit(&self) -> f64 {
        self.root_layer
            .meters_per_unit
            .unwrap_or(FALLBACK_METERS_PER_UNIT)
    }

    /// Set the up axis
    pub fn set_up_axis(&mut self, up_axis: UpAxis) {
        self.root_layer.up_axis = Some(up_axis);
    }

    /// Up axis, falling back to Y
    pub fn up_axis(&self) -> UpAxis {
        self.root_layer.up_axis.unwrap_or_default()
    }

    /// The implicit top-level container of the hierarchy
    pub fn pseudo_root(&self) -> Prim<'_> {
        Prim::new(PrimPath::abs_root(), None, &self.root_layer.root_prims)
    }

    /// Prim at `path`
    pub fn prim_at_path(&self, path: &PrimPath) -> Option<Prim<'_>> {
        if path.is_abs_root() {
            return Some(self.pseudo_root());
        }
        let spec = self.root_layer.prim_spec(path)?;
        Some(Prim::new(path.clone(), Some(spec), &spec.children))
    }

    /// All prims below the pseudo-root, depth first in authoring order
    pub fn traverse(&self) -> Vec<Prim<'_>> {
        let mut out = Vec::new();
        let mut stack: Vec<Prim<'_>> = self.pseudo_root().children();
        stack.reverse();
        while let Some(prim) = stack.pop() {
            let mut children = prim.children();
            children.reverse();
            stack.extend(children);
            out.push(prim);
        }
        out
    }
}
