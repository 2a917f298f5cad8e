//! Single-page parser
//!
//! Takes the first closed markup block. Text with no fences at all is
//! treated as raw markup.

use super::fence;
use super::lang::Lang;
use super::CodeParser;
use crate::error::ParseError;
use forge_artifact::{CodeGenMode, SinglePageArtifact};

/// Parser for [`CodeGenMode::SinglePage`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePageParser;

impl SinglePageParser {
    /// Create new single-page parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodeParser for SinglePageParser {
    type Output = SinglePageArtifact;

    fn parse(&self, raw: &str) -> Result<Self::Output, ParseError> {
        let scan = fence::scan(raw);

        let markup = if scan.has_fences() {
            scan.blocks
                .iter()
                .find(|block| block.lang() == Some(Lang::Markup))
                .map(|block| block.code.clone())
        } else {
            Some(raw.trim().to_string())
        };

        match markup {
            Some(markup) if !markup.trim().is_empty() => {
                tracing::debug!(bytes = markup.len(), "extracted single page markup");
                Ok(SinglePageArtifact::new(markup))
            }
            _ => Err(ParseError::NoCode {
                mode: self.mode(),
                blocks_seen: scan.blocks.len(),
            }),
        }
    }

    fn mode(&self) -> CodeGenMode {
        CodeGenMode::SinglePage
    }
}
