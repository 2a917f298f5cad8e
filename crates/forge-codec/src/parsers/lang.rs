//! Fence language tags and file name detection

use forge_artifact::{RelativePath, ENTRY_POINT};

/// Extensions a generated file name may carry
const KNOWN_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "scss", "less", "js", "mjs", "cjs", "jsx", "ts", "tsx", "json", "svg",
    "md", "txt", "xml", "vue",
];

/// Language families the parser knows default names for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Lang {
    Markup,
    Stylesheet,
    Script,
}

impl Lang {
    /// Classify a fence language tag
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "html" | "htm" | "xhtml" => Some(Self::Markup),
            "css" => Some(Self::Stylesheet),
            "js" | "javascript" | "mjs" => Some(Self::Script),
            _ => None,
        }
    }

    /// File name an unnamed block of this language is saved as
    pub(crate) fn default_file(self) -> &'static str {
        match self {
            Self::Markup => ENTRY_POINT,
            Self::Stylesheet => "style.css",
            Self::Script => "script.js",
        }
    }

    /// Whether a file with `ext` can hold code of this language
    pub(crate) fn accepts_extension(self, ext: &str) -> bool {
        match self {
            Self::Markup => matches!(ext, "html" | "htm"),
            Self::Stylesheet => matches!(ext, "css" | "scss" | "less"),
            Self::Script => matches!(ext, "js" | "mjs" | "cjs" | "jsx"),
        }
    }
}

/// First file-name-like token in `text`
///
/// Tokens are runs of path characters; a token counts when it parses as a
/// [`RelativePath`] and ends in a known extension. Markdown decoration
/// (`**`, backticks, `#`, `<!-- -->`, quotes) falls outside the token set.
pub(crate) fn find_file_name(text: &str) -> Option<RelativePath> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')))
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            let path: RelativePath = token.parse().ok()?;
            let ext = path.extension()?;
            KNOWN_EXTENSIONS.contains(&ext.as_str()).then_some(path)
        })
}

/// File name carried in a fence info string
///
/// Covers ` ```js src/app.js`, ` ```html:index.html`, ` ```css title="main.css"`
/// and a bare ` ```index.html`.
pub(crate) fn file_from_info(info: &str) -> Option<RelativePath> {
    find_file_name(info)
}
