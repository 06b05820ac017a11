// SPDX-License-Identifier: MIT OR Apache-2.0
//! Absolute prim paths.

use crate::error::{Result, StageError};
use std::fmt;
use std::str::FromStr;

/// Absolute path to a prim, e.g. `/merge/ref1`.
///
/// The pseudo-root is `/`. Every other element must be an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimPath(String);

impl PrimPath {
    /// The pseudo-root path `/`
    pub fn abs_root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate an absolute prim path
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path == "/" {
            return Ok(Self(path));
        }

        let Some(rest) = path.strip_prefix('/') else {
            return Err(StageError::InvalidPath(path));
        };

        if rest.split('/').all(is_valid_identifier) {
            Ok(Self(path))
        } else {
            Err(StageError::InvalidPath(path))
        }
    }

    /// Whether this is the pseudo-root
    pub fn is_abs_root(&self) -> bool {
        self.0 == "/"
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last element of the path, empty for the pseudo-root
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Path elements from the root down
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|e| !e.is_empty())
    }

    /// Parent path, `None` for the pseudo-root
    pub fn parent(&self) -> Option<PrimPath> {
        if self.is_abs_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::abs_root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Whether this path names a prim directly under the pseudo-root
    pub fn is_root_prim(&self) -> bool {
        self.parent().is_some_and(|p| p.is_abs_root())
    }

    /// Append a child element
    pub fn append_child(&self, name: &str) -> Result<PrimPath> {
        if !is_valid_identifier(name) {
            return Err(StageError::InvalidName(name.to_string()));
        }
        if self.is_abs_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PrimPath {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for PrimPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check that `name` is a valid prim identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
