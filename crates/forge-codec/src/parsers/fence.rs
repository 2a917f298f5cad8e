//! Fenced block scanner
//!
//! Walks the Markdown event stream with source offsets and keeps only fenced
//! blocks that are closed. A block still open at end of input (stream cut
//! short) is counted as unterminated and otherwise ignored.
//!
//! CommonMark folds a fence that directly follows a raw HTML line into the
//! HTML block, so no code block event is emitted for it. A line-level pass
//! recovers those fences; blocks the Markdown pass already reported win.

use super::lang::Lang;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as MdParser, Tag, TagEnd};
use std::ops::Range;

/// A closed fenced block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FencedBlock<'a> {
    /// Full info string after the opening fence
    pub(crate) info: String,
    /// Inner text, verbatim
    pub(crate) code: String,
    /// Nearest non-blank line above the fence that is not part of an
    /// earlier block
    pub(crate) hint: Option<&'a str>,
}

impl FencedBlock<'_> {
    /// First token of the info string, lowercased
    pub(crate) fn language(&self) -> Option<String> {
        let token = self
            .info
            .split(|c: char| c.is_whitespace() || c == ':' || c == '{' || c == ',')
            .next()?
            .trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_ascii_lowercase())
        }
    }

    /// Known language family of the tag, if any
    pub(crate) fn lang(&self) -> Option<Lang> {
        self.language().as_deref().and_then(Lang::from_tag)
    }
}

/// Result of scanning generated text
#[derive(Debug, Default)]
pub(crate) struct FenceScan<'a> {
    /// Closed blocks in source order
    pub(crate) blocks: Vec<FencedBlock<'a>>,
    /// Blocks opened but never closed
    pub(crate) unterminated: usize,
}

impl FenceScan<'_> {
    /// Whether the text contains any fence line at all, including fences
    /// hidden inside HTML blocks
    #[inline]
    pub(crate) fn has_fences(&self) -> bool {
        !self.blocks.is_empty() || self.unterminated > 0
    }
}

/// A fence found by either pass, before hints are attached
#[derive(Debug)]
struct Found {
    span: Range<usize>,
    info: String,
    code: String,
    closed: bool,
}

/// Scan `raw` for fenced code blocks
pub(crate) fn scan(raw: &str) -> FenceScan<'_> {
    let mut found = markdown_blocks(raw);
    let hidden: Vec<Found> = line_blocks(raw)
        .into_iter()
        .filter(|line| !found.iter().any(|md| overlaps(&md.span, &line.span)))
        .collect();
    if !hidden.is_empty() {
        tracing::debug!(count = hidden.len(), "recovered fences inside html blocks");
        found.extend(hidden);
        found.sort_by_key(|block| block.span.start);
    }

    let mut scan = FenceScan::default();
    let mut prev_end = 0;
    for block in found {
        if block.closed {
            scan.blocks.push(FencedBlock {
                info: block.info,
                code: block.code,
                hint: raw.get(prev_end..block.span.start).and_then(hint_line),
            });
        } else {
            scan.unterminated += 1;
        }
        prev_end = block.span.end;
    }
    scan
}

struct OpenBlock {
    info: String,
    span: Range<usize>,
    code: String,
}

/// Fenced code blocks as pulldown-cmark reports them
fn markdown_blocks(raw: &str) -> Vec<Found> {
    let mut found = Vec::new();
    let mut open: Option<OpenBlock> = None;

    for (event, range) in MdParser::new_ext(raw, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                open = Some(OpenBlock {
                    info: info.to_string(),
                    span: range,
                    code: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(block) = open.as_mut() {
                    block.code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                let Some(block) = open.take() else {
                    continue;
                };
                let span = block.span.start..block.span.end.max(range.end);
                found.push(Found {
                    closed: is_closed(&raw[span.clone()]),
                    span,
                    info: block.info,
                    code: block.code,
                });
            }
            _ => {}
        }
    }
    found
}

struct LineFence {
    start: usize,
    fence_char: char,
    fence_len: usize,
    info: String,
    content_start: usize,
}

/// Fenced blocks found line by line, ignoring surrounding Markdown structure
fn line_blocks(raw: &str) -> Vec<Found> {
    let mut found = Vec::new();
    let mut open: Option<LineFence> = None;
    let mut offset = 0;

    for line in raw.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let closing = open
            .as_ref()
            .is_some_and(|fence| closes(line, fence.fence_char, fence.fence_len));
        if closing {
            if let Some(fence) = open.take() {
                found.push(Found {
                    span: fence.start..offset,
                    info: fence.info,
                    code: raw[fence.content_start..line_start].to_string(),
                    closed: true,
                });
            }
        } else if open.is_none() {
            if let Some((fence_char, fence_len, info)) = opening_fence(line) {
                open = Some(LineFence {
                    start: line_start,
                    fence_char,
                    fence_len,
                    info: info.to_string(),
                    content_start: offset,
                });
            }
        }
    }

    if let Some(fence) = open {
        found.push(Found {
            span: fence.start..raw.len(),
            info: fence.info,
            code: raw[fence.content_start..].to_string(),
            closed: false,
        });
    }
    found
}

/// Line without its terminator and with at most three spaces of indent
fn fence_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let body = line.trim_start_matches(' ');
    (line.len() - body.len() <= 3).then_some(body)
}

/// Fence character, fence length and info string of an opening fence line
fn opening_fence(line: &str) -> Option<(char, usize, &str)> {
    let body = fence_line(line)?;
    let fence_char = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let fence_len = body.chars().take_while(|c| *c == fence_char).count();
    if fence_len < 3 {
        return None;
    }
    let info = body[fence_len..].trim();
    if fence_char == '`' && info.contains('`') {
        return None;
    }
    Some((fence_char, fence_len, info))
}

fn closes(line: &str, fence_char: char, fence_len: usize) -> bool {
    fence_line(line).map(str::trim_end).is_some_and(|body| {
        body.len() >= fence_len && body.chars().all(|c| c == fence_char)
    })
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Last non-blank line of the text between two blocks
fn hint_line(between: &str) -> Option<&str> {
    between
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
}

/// Strip indentation and blockquote markers in front of a fence
fn fence_body(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
}

/// Whether a block's source span ends in a closing fence
fn is_closed(span: &str) -> bool {
    let mut lines = span.trim_end_matches(['\n', '\r']).lines();
    let Some(opening) = lines.next().map(fence_body) else {
        return false;
    };
    let Some(fence_char) = opening.chars().next().filter(|c| *c == '`' || *c == '~') else {
        return false;
    };
    let fence_len = opening.chars().take_while(|c| *c == fence_char).count();

    let Some(closing) = lines.last().map(|l| fence_body(l).trim_end()) else {
        return false;
    };
    closing.len() >= fence_len && closing.chars().all(|c| c == fence_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scan_closed_blocks_in_order() {
        let raw = "```html\n<h1>Hi</h1>\n```\n```css\nh1{color:red}\n```\n";
        let scan = scan(raw);
        assert_eq!(scan.unterminated, 0);
        assert_eq!(scan.blocks.len(), 2);
        assert_eq!(scan.blocks[0].language().as_deref(), Some("html"));
        assert_eq!(scan.blocks[0].code, "<h1>Hi</h1>\n");
        assert_eq!(scan.blocks[1].language().as_deref(), Some("css"));
        assert_eq!(scan.blocks[1].code, "h1{color:red}\n");
    }

    #[test]
    fn scan_ignores_unterminated_tail() {
        let raw = "```css\na{}\n```\n\n```js\nconsole.log('cut";
        let scan = scan(raw);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.unterminated, 1);
        assert!(scan.has_fences());
    }

    #[test]
    fn scan_without_fences() {
        let scan = scan("<html><body>plain</body></html>");
        assert!(scan.blocks.is_empty());
        assert!(!scan.has_fences());
    }

    #[test]
    fn scan_captures_hint_line_above_fence() {
        let raw = "Intro text.\n\n**src/app.js**\n```js\nrun();\n```\n```css\nb{}\n```\n";
        let scan = scan(raw);
        assert_eq!(scan.blocks[0].hint, Some("**src/app.js**"));
        assert_eq!(scan.blocks[1].hint, None);
    }

    #[test]
    fn scan_accepts_tilde_and_longer_fences() {
        let raw = "~~~html\n<p>a</p>\n~~~\n````js\nlet s = \"```\";\n````\n";
        let scan = scan(raw);
        assert_eq!(scan.blocks.len(), 2);
        assert_eq!(scan.blocks[1].code, "let s = \"```\";\n");
    }

    #[test]
    fn scan_recovers_fence_below_html_line() {
        let raw = "<div>intro</div>\n```html\n<p>x</p>\n```\n";
        let scan = scan(raw);
        assert_eq!(scan.unterminated, 0);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].language().as_deref(), Some("html"));
        assert_eq!(scan.blocks[0].code, "<p>x</p>\n");
        assert_eq!(scan.blocks[0].hint, Some("<div>intro</div>"));
    }

    #[test]
    fn scan_keeps_order_with_recovered_fences() {
        let raw = "```css\na{}\n```\n\n<div>\n```js\nrun();\n```\n";
        let scan = scan(raw);
        let langs: Vec<Option<String>> = scan.blocks.iter().map(FencedBlock::language).collect();
        assert_eq!(langs, vec![Some("css".to_string()), Some("js".to_string())]);
    }

    #[test]
    fn scan_counts_open_fence_inside_html_block() {
        let raw = "<section>\n```html\n<p>cut";
        let scan = scan(raw);
        assert!(scan.blocks.is_empty());
        assert_eq!(scan.unterminated, 1);
        assert!(scan.has_fences());
    }

    #[test]
    fn line_pass_ignores_inline_backticks_and_deep_indent() {
        assert!(opening_fence("``js``\n").is_none());
        assert!(opening_fence("    ```js\n").is_none());
        assert!(opening_fence("```js `x`\n").is_none());
        assert_eq!(opening_fence("~~~ css\n"), Some(('~', 3, "css")));
        assert!(closes("  ````\n", '`', 3));
        assert!(!closes("```js\n", '`', 3));
    }

    #[test]
    fn language_splits_info_string() {
        let block = FencedBlock {
            info: "HTML:index.html".to_string(),
            code: String::new(),
            hint: None,
        };
        assert_eq!(block.language().as_deref(), Some("html"));
    }

    #[test]
    fn closing_fence_detection() {
        assert!(is_closed("```js\nx\n```\n"));
        assert!(is_closed("```js\n```"));
        assert!(!is_closed("```js\nx\n"));
        assert!(!is_closed("````js\nx\n```\n"));
        assert!(!is_closed("```js"));
    }
}
