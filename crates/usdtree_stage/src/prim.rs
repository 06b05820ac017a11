// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prim specs and read-only prim handles.

use crate::path::PrimPath;
use indexmap::IndexMap;
use std::fmt;

/// How a prim spec contributes to the composed prim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    /// Concrete definition
    Def,
    /// Override applied over whatever is composed underneath
    Over,
    /// Abstract class
    Class,
}

impl Specifier {
    /// Keyword used in the text format
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A reference arc to another layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Asset path of the referenced layer
    pub asset_path: String,
    /// Target prim in the referenced layer, its default prim when `None`
    pub prim_path: Option<PrimPath>,
}

impl Reference {
    /// Reference the default prim of a layer
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            prim_path: None,
        }
    }

    /// Reference a specific prim of a layer
    pub fn with_prim_path(mut self, prim_path: PrimPath) -> Self {
        self.prim_path = Some(prim_path);
        self
    }
}

/// Authored opinions for a single prim in a layer
#[derive(Debug, Clone, PartialEq)]
pub struct PrimSpec {
    /// Specifier
    pub specifier: Specifier,
    /// Schema type name, e.g. `Xform`
    pub type_name: Option<String>,
    /// Prepended reference arcs, strongest first
    pub references: Vec<Reference>,
    /// Child specs in authoring order
    pub(crate) children: IndexMap<String, PrimSpec>,
}

impl PrimSpec {
    /// Create an empty spec
    pub fn new(specifier: Specifier) -> Self {
        Self {
            specifier,
            type_name: None,
            references: Vec::new(),
            children: IndexMap::new(),
        }
    }

    /// Set the type name
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Add a reference arc
    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    /// Child spec by name
    pub fn child(&self, name: &str) -> Option<&PrimSpec> {
        self.children.get(name)
    }

    /// Child names in authoring order
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Insert or replace a child spec
    pub fn insert_child(&mut self, name: impl Into<String>, spec: PrimSpec) {
        self.children.insert(name.into(), spec);
    }
}

/// Read-only view of a prim on a stage
#[derive(Debug, Clone)]
pub struct Prim<'a> {
    path: PrimPath,
    spec: Option<&'a PrimSpec>,
    children: &'a IndexMap<String, PrimSpec>,
}

impl<'a> Prim<'a> {
    pub(crate) fn new(
        path: PrimPath,
        spec: Option<&'a PrimSpec>,
        children: &'a IndexMap<String, PrimSpec>,
    ) -> Self {
        Self {
            path,
            spec,
            children,
        }
    }

    /// Absolute path
    pub fn path(&self) -> &PrimPath {
        &self.path
    }

    /// Prim name (last path element)
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Whether this is the pseudo-root
    pub fn is_pseudo_root(&self) -> bool {
        self.spec.is_none()
    }

    /// Specifier, `None` for the pseudo-root
    pub fn specifier(&self) -> Option<Specifier> {
        self.spec.map(|s| s.specifier)
    }

    /// Type name, if any
    pub fn type_name(&self) -> Option<&'a str> {
        self.spec.and_then(|s| s.type_name.as_deref())
    }

    /// Reference arcs authored on this prim
    pub fn references(&self) -> &'a [Reference] {
        self.spec.map(|s| s.references.as_slice()).unwrap_or_default()
    }

    /// Direct children in authoring order
    pub fn children(&self) -> Vec<Prim<'a>> {
        self.children
            .iter()
            .filter_map(|(name, spec)| {
                let path = self.path.append_child(name).ok()?;
                Some(Prim::new(path, Some(spec), &spec.children))
            })
            .collect()
    }
}
