//! Parsed generation results
//!
//! [`ParsedCode`] is a sum type: the parser produces exactly one variant and
//! the saver matches on it, so no caller ever inspects an untyped result.

use crate::path::RelativePath;
use crate::types::CodeGenMode;
use serde::{Deserialize, Serialize};

/// File name every single-page artifact is written to, and the entry point
/// a multi-file artifact is expected to contain
pub const ENTRY_POINT: &str = "index.html";

/// Structured code extracted from model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedCode {
    /// One self-contained page
    SinglePage(SinglePageArtifact),
    /// Several files under one root
    MultiFile(MultiFileArtifact),
}

impl ParsedCode {
    /// Mode this variant belongs to
    #[inline]
    #[must_use]
    pub fn mode(&self) -> CodeGenMode {
        match self {
            Self::SinglePage(_) => CodeGenMode::SinglePage,
            Self::MultiFile(_) => CodeGenMode::MultiFile,
        }
    }

    /// Number of files this result writes
    #[inline]
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self {
            Self::SinglePage(_) => 1,
            Self::MultiFile(multi) => multi.files.len(),
        }
    }
}

impl From<SinglePageArtifact> for ParsedCode {
    fn from(value: SinglePageArtifact) -> Self {
        Self::SinglePage(value)
    }
}

impl From<MultiFileArtifact> for ParsedCode {
    fn from(value: MultiFileArtifact) -> Self {
        Self::MultiFile(value)
    }
}

/// A single HTML page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePageArtifact {
    /// Page markup, verbatim
    pub markup: String,
}

impl SinglePageArtifact {
    /// Wrap markup
    #[inline]
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// Whether the markup is empty or whitespace only
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.markup.trim().is_empty()
    }
}

/// A project tree, in first-occurrence order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiFileArtifact {
    /// Files to write
    pub files: Vec<ArtifactFile>,
}

impl MultiFileArtifact {
    /// Build from files
    #[inline]
    #[must_use]
    pub fn new(files: Vec<ArtifactFile>) -> Self {
        Self { files }
    }

    /// Look up a file by path
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ArtifactFile> {
        let path: RelativePath = path.parse().ok()?;
        self.files.iter().find(|f| f.path == path)
    }

    /// Whether the conventional entry point is present
    #[must_use]
    pub fn has_entry_point(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.path.depth() == 1 && f.path.file_name() == ENTRY_POINT)
    }
}

/// One file of a multi-file artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// Location relative to the artifact root
    pub path: RelativePath,
    /// File contents, verbatim
    pub content: String,
}

impl ArtifactFile {
    /// Create a file entry
    #[inline]
    #[must_use]
    pub fn new(path: RelativePath, content: impl Into<String>) -> Self {
        Self {
            path,
            content: content.into(),
        }
    }
}
