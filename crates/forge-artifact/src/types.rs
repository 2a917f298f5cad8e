//! Identifiers and generation modes

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Application identifier
///
/// Keys the generator pool, chat history and artifact directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u64);

impl AppId {
    /// Zero id used by callers that predate per-application artifacts
    pub const LEGACY: Self = Self(0);

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AppId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Authenticated principal on whose behalf a generation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What shape of artifact a generation should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeGenMode {
    /// One self-contained HTML page
    #[serde(rename = "html")]
    SinglePage,
    /// A project tree of several files
    MultiFile,
}

impl CodeGenMode {
    /// Stable value used in directory names and on the wire
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SinglePage => "html",
            Self::MultiFile => "multi_file",
        }
    }
}

impl Display for CodeGenMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeGenMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "html" | "single_page" | "single" => Ok(Self::SinglePage),
            "multi_file" | "multi" | "multifile" => Ok(Self::MultiFile),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Mode string that matches no [`CodeGenMode`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown generation mode: '{0}' (expected 'html' or 'multi_file')")]
pub struct UnknownMode(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_names() {
        assert_eq!(CodeGenMode::SinglePage.as_str(), "html");
        assert_eq!(CodeGenMode::MultiFile.as_str(), "multi_file");
        assert_eq!(
            serde_json::to_string(&CodeGenMode::MultiFile).unwrap(),
            "\"multi_file\""
        );
        assert_eq!(
            serde_json::from_str::<CodeGenMode>("\"html\"").unwrap(),
            CodeGenMode::SinglePage
        );
    }

    #[test]
    fn mode_from_str_accepts_aliases() {
        assert_eq!("HTML".parse(), Ok(CodeGenMode::SinglePage));
        assert_eq!("single-page".parse(), Ok(CodeGenMode::SinglePage));
        assert_eq!("multi-file".parse(), Ok(CodeGenMode::MultiFile));
        assert!("vue".parse::<CodeGenMode>().is_err());
    }

    #[test]
    fn legacy_app_id_is_zero() {
        assert_eq!(AppId::LEGACY.get(), 0);
        assert_eq!(AppId::from(42).to_string(), "42");
    }
}
