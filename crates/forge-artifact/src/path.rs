//! Relative file paths inside an artifact root
//!
//! [`RelativePath`] is the only way a generated file name reaches the
//! filesystem. Construction normalizes the path and rejects anything that
//! could escape the artifact root.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Normalized, root-confined relative path
///
/// Segments are joined with `/`. `.` segments and repeated separators are
/// dropped during normalization, so `./css//main.css` and `css/main.css`
/// compare equal.
///
/// # Examples
/// - `index.html` → `index.html`
/// - `./src/app.js` → `src/app.js`
/// - `../etc/passwd` → rejected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Final segment (the file name)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Extension of the file name, lowercased
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Join onto a directory
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.0.iter().collect()
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for RelativePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('/') {
            return Err(PathError::Absolute(s.to_string()));
        }
        if let Some(c) = s.chars().find(|c| *c == '\\' || c.is_control()) {
            return Err(PathError::InvalidCharacter {
                path: s.to_string(),
                ch: c,
            });
        }

        let mut segments = Vec::new();
        for seg in s.split('/') {
            match seg {
                "" | "." => {}
                ".." => return Err(PathError::Traversal(s.to_string())),
                seg if seg.contains(':') => {
                    return Err(PathError::InvalidCharacter {
                        path: s.to_string(),
                        ch: ':',
                    })
                }
                seg => segments.push(seg.to_string()),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments))
    }
}

impl serde::Serialize for RelativePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for RelativePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to relative paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Nothing left after normalization
    #[error("path is empty")]
    Empty,

    /// Leading separator
    #[error("absolute path not allowed: '{0}'")]
    Absolute(String),

    /// `..` segment
    #[error("path escapes artifact root: '{0}'")]
    Traversal(String),

    /// Backslash, drive separator or control character
    #[error("invalid character {ch:?} in path '{path}'")]
    InvalidCharacter { path: String, ch: char },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn path_simple_file() {
        let path: RelativePath = "index.html".parse().unwrap();
        assert_eq!(path.segments(), &["index.html"]);
        assert_eq!(path.file_name(), "index.html");
        assert_eq!(path.extension().as_deref(), Some("html"));
    }

    #[test]
    fn path_normalizes_dots_and_separators() {
        let a: RelativePath = "./css//main.css".parse().unwrap();
        let b: RelativePath = "css/main.css".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "css/main.css");
        assert_eq!(a.depth(), 2);
    }

    #[test]
    fn path_rejects_escape_attempts() {
        assert!(matches!(
            "../secret".parse::<RelativePath>(),
            Err(PathError::Traversal(_))
        ));
        assert!(matches!(
            "a/../../b".parse::<RelativePath>(),
            Err(PathError::Traversal(_))
        ));
        assert!(matches!(
            "/etc/passwd".parse::<RelativePath>(),
            Err(PathError::Absolute(_))
        ));
        assert!(matches!(
            "C:/windows".parse::<RelativePath>(),
            Err(PathError::InvalidCharacter { ch: ':', .. })
        ));
        assert!(matches!(
            "a\\b.js".parse::<RelativePath>(),
            Err(PathError::InvalidCharacter { ch: '\\', .. })
        ));
    }

    #[test]
    fn path_rejects_empty() {
        assert_eq!("".parse::<RelativePath>(), Err(PathError::Empty));
        assert_eq!("./".parse::<RelativePath>(), Err(PathError::Empty));
        assert_eq!("   ".parse::<RelativePath>(), Err(PathError::Empty));
    }

    #[test]
    fn path_extension_edge_cases() {
        let dotfile: RelativePath = ".env".parse().unwrap();
        assert_eq!(dotfile.extension(), None);
        let upper: RelativePath = "App.JS".parse().unwrap();
        assert_eq!(upper.extension().as_deref(), Some("js"));
    }

    #[test]
    fn path_to_path_buf_joins_segments() {
        let path: RelativePath = "src/components/app.js".parse().unwrap();
        assert_eq!(
            path.to_path_buf(),
            PathBuf::from("src").join("components").join("app.js")
        );
    }

    proptest! {
        #[test]
        fn prop_parsed_paths_stay_inside_root(raw in "[a-z./]{0,24}") {
            if let Ok(path) = raw.parse::<RelativePath>() {
                prop_assert!(path.depth() > 0);
                prop_assert!(path.segments().iter().all(|s| !s.is_empty() && s != "." && s != ".."));
                let reparsed: RelativePath = path.to_string().parse().unwrap();
                prop_assert_eq!(reparsed, path);
            }
        }
    }
}
