//! Error types for the codec
//!
//! - Parse operations (generated text → `ParsedCode`)
//! - Save operations (`ParsedCode` → files)

use forge_artifact::{CodeGenMode, PathError};
use std::path::PathBuf;

/// Errors extracting code from generated text
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Nothing usable for the requested mode
    #[error("no extractable {mode} code found ({blocks_seen} complete fenced blocks seen)")]
    NoCode {
        mode: CodeGenMode,
        blocks_seen: usize,
    },
}

impl ParseError {
    /// Mode the parse was attempted for
    #[inline]
    #[must_use]
    pub fn mode(&self) -> CodeGenMode {
        match self {
            Self::NoCode { mode, .. } => *mode,
        }
    }
}

/// Errors persisting a parsed result
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Result violates its invariants
    #[error("validation failed: {0}")]
    Validation(String),

    /// Result variant does not belong to the requested mode
    #[error("result is {actual} code but {expected} was requested")]
    ModeMismatch {
        expected: CodeGenMode,
        actual: CodeGenMode,
    },

    /// Invalid relative path
    #[error("invalid artifact path: {0}")]
    Path(#[from] PathError),

    /// Filesystem failure
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from the filesystem rather than the input
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
