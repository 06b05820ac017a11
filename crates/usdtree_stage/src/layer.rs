// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layers: a root prim hierarchy plus layer metadata.

use crate::error::{Result, StageError};
use crate::path::PrimPath;
use crate::prim::{PrimSpec, Specifier};
use crate::usda;
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

static ANONYMOUS_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Stage up axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    /// Y up
    #[default]
    Y,
    /// Z up
    Z,
}

impl UpAxis {
    /// Token used in layer metadata
    pub fn token(&self) -> &'static str {
        match self {
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            other => Err(format!("unknown up axis {other:?}")),
        }
    }
}

/// A single layer of scene description
#[derive(Debug, Clone)]
pub struct Layer {
    identifier: String,
    real_path: Option<PathBuf>,
    /// Layer documentation string
    pub doc: Option<String>,
    /// Name of the root prim nominated as the entry point
    pub default_prim: Option<String>,
    /// Authored up axis
    pub up_axis: Option<UpAxis>,
    /// Authored linear unit scale
    pub meters_per_unit: Option<f64>,
    pub(crate) root_prims: IndexMap<String, PrimSpec>,
}

impl Layer {
    /// Create an empty layer backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            identifier: path.display().to_string(),
            real_path: Some(path),
            doc: None,
            default_prim: None,
            up_axis: None,
            meters_per_unit: None,
            root_prims: IndexMap::new(),
        }
    }

    /// Create an empty in-memory layer
    pub fn anonymous() -> Self {
        let n = ANONYMOUS_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            identifier: format!("anon:{n:04}.usda"),
            real_path: None,
            doc: None,
            default_prim: None,
            up_axis: None,
            meters_per_unit: None,
            root_prims: IndexMap::new(),
        }
    }

    /// Read a layer from a usda file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let real_path = path
            .canonicalize()
            .map_err(|e| StageError::io(path, e))?;
        let text = std::fs::read_to_string(&real_path).map_err(|e| StageError::io(path, e))?;

        let mut layer = usda::read_layer(&text)?;
        layer.identifier = real_path.display().to_string();
        layer.real_path = Some(real_path);
        Ok(layer)
    }

    /// Parse a layer from usda text, unattached to any file
    pub fn from_usda(text: &str) -> Result<Self> {
        usda::read_layer(text)
    }

    /// Layer identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Resolved file path, `None` for anonymous layers
    pub fn real_path(&self) -> Option<&Path> {
        self.real_path.as_deref()
    }

    /// Whether the layer has no file behind it
    pub fn is_anonymous(&self) -> bool {
        self.real_path.is_none()
    }

    /// Root prim specs in authoring order
    pub fn root_prims(&self) -> impl Iterator<Item = (&str, &PrimSpec)> {
        self.root_prims.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Insert or replace a root prim spec
    pub fn insert_root_prim(&mut self, name: impl Into<String>, spec: PrimSpec) {
        self.root_prims.insert(name.into(), spec);
    }

    /// Spec at `path`
    pub fn prim_spec(&self, path: &PrimPath) -> Option<&PrimSpec> {
        let mut elements = path.elements();
        let mut spec = self.root_prims.get(elements.next()?)?;
        for name in elements {
            spec = spec.children.get(name)?;
        }
        Some(spec)
    }

    /// Mutable spec at `path`
    pub fn prim_spec_mut(&mut self, path: &PrimPath) -> Option<&mut PrimSpec> {
        let mut elements = path.elements();
        let mut spec = self.root_prims.get_mut(elements.next()?)?;
        for name in elements {
            spec = spec.children.get_mut(name)?;
        }
        Some(spec)
    }

    /// Spec at `path`, creating it and any missing ancestors with `specifier`
    pub(crate) fn ensure_prim_spec(
        &mut self,
        path: &PrimPath,
        specifier: Specifier,
    ) -> Result<&mut PrimSpec> {
        let mut elements = path.elements();
        let first = elements
            .next()
            .ok_or_else(|| StageError::InvalidPath(path.to_string()))?;

        let mut spec = self
            .root_prims
            .entry(first.to_string())
            .or_insert_with(|| PrimSpec::new(specifier));
        for name in elements {
            spec = spec
                .children
                .entry(name.to_string())
                .or_insert_with(|| PrimSpec::new(specifier));
        }
        Ok(spec)
    }

    /// Serialize to usda text
    pub fn to_usda(&self) -> String {
        usda::write_layer(self)
    }

    /// Write the layer to an arbitrary file
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
        }
        std::fs::write(path, self.to_usda()).map_err(|e| StageError::io(path, e))?;
        tracing::debug!("Exported layer {} to {:?}", self.identifier, path);
        Ok(())
    }

    /// Write the layer back to its own file
    pub fn save(&self) -> Result<()> {
        let path = self.real_path.as_ref().ok_or(StageError::AnonymousLayer)?;
        self.export(path)
    }
}
