//! Error types for Forge Core
//!
//! Provides error handling for:
//! - Backend construction and streaming failures
//! - Generator pool creation
//! - Chat history reads and writes
//! - Pipeline runs (aggregating parse and save errors from the codec)

use forge_codec::{ParseError, SaveError};
use std::path::PathBuf;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Request could not be started
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backend failed while generating
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Generated text held no usable code
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    /// Parsed code could not be written
    #[error("save failed: {0}")]
    Save(#[from] SaveError),

    /// Chat history store failed
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// Caller went away before the stream finished
    #[error("generation cancelled")]
    Cancelled,
}

impl ForgeError {
    /// Whether the error happened after content was fully generated
    #[inline]
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Save(_))
    }
}

impl From<PoolError> for ForgeError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Configuration(message) => Self::Configuration(message),
        }
    }
}

/// Errors raised by a generation backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response could not be decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Backend reported an error in-stream
    #[error("backend reported: {0}")]
    Remote(String),
}

/// Generator pool errors
///
/// Clone so a single failed initialization can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Backend could not be built from configuration
    #[error("cannot build generator: {0}")]
    Configuration(String),
}

/// Chat history store errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Storage read or write failed
    #[error("history io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored record could not be decoded
    #[error("corrupt history record: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Message rejected before storage
    #[error("invalid history message: {0}")]
    Invalid(String),
}

impl HistoryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::ForgeConfig`]
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_artifact::CodeGenMode;

    #[test]
    fn pool_error_maps_to_configuration() {
        let err: ForgeError = PoolError::Configuration("model name is empty".into()).into();
        assert!(matches!(err, ForgeError::Configuration(ref m) if m == "model name is empty"));
    }

    #[test]
    fn persistence_errors_are_classified() {
        let parse = ForgeError::from(ParseError::NoCode {
            mode: CodeGenMode::SinglePage,
            blocks_seen: 0,
        });
        assert!(parse.is_persistence());
        assert!(!ForgeError::Cancelled.is_persistence());
        assert!(!ForgeError::from(BackendError::Remote("boom".into())).is_persistence());
    }

    #[test]
    fn error_messages_are_lowercase() {
        let err = BackendError::Status {
            status: 404,
            body: "model not found".into(),
        };
        assert_eq!(err.to_string(), "backend returned status 404: model not found");
    }
}
