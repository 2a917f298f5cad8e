//! Multi-file parser
//!
//! Every closed fenced block is mapped to a file, in this order of
//! preference:
//! 1. a file name in the fence info string,
//! 2. a file name on the line above the fence,
//! 3. the default name for the block's language, unless an earlier block of
//!    that language already took it by name or by default.
//!
//! Names that contradict the language tag (a `css` block under a line that
//! mentions `index.html`) are not used. A name seen twice keeps its first
//! position and takes the later content.

use super::fence::{self, FencedBlock};
use super::lang::{self, Lang};
use super::CodeParser;
use crate::error::ParseError;
use forge_artifact::{ArtifactFile, CodeGenMode, MultiFileArtifact, RelativePath};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Parser for [`CodeGenMode::MultiFile`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiFileParser;

impl MultiFileParser {
    /// Create new multi-file parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Explicit name for a block, if the info string or hint line gives one
    fn explicit_name(block: &FencedBlock<'_>) -> Option<RelativePath> {
        let lang = block.lang();
        let compatible = |path: &RelativePath| match (lang, path.extension()) {
            (Some(lang), Some(ext)) => lang.accepts_extension(&ext),
            _ => true,
        };

        lang::file_from_info(&block.info)
            .filter(compatible)
            .or_else(|| block.hint.and_then(lang::find_file_name).filter(compatible))
    }
}

impl CodeParser for MultiFileParser {
    type Output = MultiFileArtifact;

    fn parse(&self, raw: &str) -> Result<Self::Output, ParseError> {
        let scan = fence::scan(raw);
        if scan.unterminated > 0 {
            tracing::debug!(
                unterminated = scan.unterminated,
                "ignoring unterminated fenced blocks"
            );
        }

        let mut files: IndexMap<RelativePath, String> = IndexMap::new();
        let mut defaulted: HashSet<Lang> = HashSet::new();

        for (index, block) in scan.blocks.iter().enumerate() {
            let path = match Self::explicit_name(block) {
                Some(path) => {
                    // A block named after its language default takes that slot
                    if let Some(lang) = block.lang() {
                        if matches!(path.segments(), [only] if only == lang.default_file()) {
                            defaulted.insert(lang);
                        }
                    }
                    Some(path)
                }
                None => block
                    .lang()
                    .filter(|lang| defaulted.insert(*lang))
                    .and_then(|lang| lang.default_file().parse().ok()),
            };

            let Some(path) = path else {
                tracing::debug!(
                    block = index,
                    info = %block.info,
                    "skipping fenced block with no file target"
                );
                continue;
            };

            if files.insert(path.clone(), block.code.clone()).is_some() {
                tracing::debug!(%path, "later block replaces earlier content");
            }
        }

        if files.is_empty() {
            return Err(ParseError::NoCode {
                mode: self.mode(),
                blocks_seen: scan.blocks.len(),
            });
        }

        tracing::debug!(files = files.len(), "extracted multi-file project");
        Ok(MultiFileArtifact::new(
            files
                .into_iter()
                .map(|(path, content)| ArtifactFile::new(path, content))
                .collect(),
        ))
    }

    fn mode(&self) -> CodeGenMode {
        CodeGenMode::MultiFile
    }
}
