//! Parsers from generated text to typed results
//!
//! One parser per [`CodeGenMode`]:
//! - [`SinglePageParser`] - first closed markup block, or raw markup
//! - [`MultiFileParser`] - every identifiable closed block as a named file
//!
//! Fences are scanned with pulldown-cmark. Text cut off mid-block never
//! panics; the incomplete block is ignored.

use crate::error::ParseError;
use forge_artifact::{CodeGenMode, ParsedCode};

mod fence;
mod lang;
mod multi_file;
mod single_page;

pub use multi_file::MultiFileParser;
pub use single_page::SinglePageParser;

/// Parser trait for turning accumulated model output into a mode's result
pub trait CodeParser: Send + Sync + 'static {
    /// Result type this parser produces
    type Output: Into<ParsedCode>;

    /// Extract code from the full generated text
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoCode`] when nothing usable is found.
    fn parse(&self, raw: &str) -> Result<Self::Output, ParseError>;

    /// Mode handled by this parser
    fn mode(&self) -> CodeGenMode;
}

/// Parse generated text according to `mode`
///
/// # Errors
///
/// Returns [`ParseError::NoCode`] when the text holds no code for `mode`.
pub fn parse(raw: &str, mode: CodeGenMode) -> Result<ParsedCode, ParseError> {
    match mode {
        CodeGenMode::SinglePage => SinglePageParser.parse(raw).map(Into::into),
        CodeGenMode::MultiFile => MultiFileParser.parse(raw).map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dispatches_on_mode() {
        let raw = "```html\n<h1>Hi</h1>\n```\n```css\nh1{color:red}\n```\n";

        let single = parse(raw, CodeGenMode::SinglePage).unwrap();
        assert_eq!(single.mode(), CodeGenMode::SinglePage);
        assert_eq!(single.file_count(), 1);

        let multi = parse(raw, CodeGenMode::MultiFile).unwrap();
        assert_eq!(multi.mode(), CodeGenMode::MultiFile);
        assert_eq!(multi.file_count(), 2);
    }

    #[test]
    fn parse_error_carries_mode() {
        let err = parse("no code here", CodeGenMode::MultiFile).unwrap_err();
        assert_eq!(err.mode(), CodeGenMode::MultiFile);
    }
}
