// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised by stage operations.

use crate::path::PrimPath;
use std::path::PathBuf;
use thiserror::Error;

/// Stage errors
#[derive(Debug, Error)]
pub enum StageError {
    /// Path is not an absolute prim path
    #[error("Invalid prim path: {0:?}")]
    InvalidPath(String),

    /// Name is not a valid prim identifier
    #[error("Invalid prim name: {0:?}")]
    InvalidName(String),

    /// No prim spec at the given path
    #[error("Prim not found: {0}")]
    PrimNotFound(PrimPath),

    /// Default prim must be a root prim
    #[error("Default prim must be a root prim: {0}")]
    NotRootPrim(PrimPath),

    /// The layer has no file behind it
    #[error("Layer is anonymous and has no file path")]
    AnonymousLayer,

    /// File system failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed usda text
    #[error("Parse error at byte {offset}: {message}")]
    Parse {
        /// Byte offset of the offending token
        offset: usize,
        /// What went wrong
        message: String,
    },
}

impl StageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for stage operations
pub type Result<T> = std::result::Result<T, StageError>;
