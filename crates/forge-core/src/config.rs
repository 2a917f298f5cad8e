//! Pipeline configuration
//!
//! Loaded from TOML; every field has a default so a partial file works:
//!
//! ```toml
//! output_root = "tmp/code_output"
//!
//! [backend]
//! base_url = "http://localhost:11434"
//! model = "qwen2.5-coder"
//!
//! [pool]
//! max_instances = 1000
//! idle_ttl_secs = 1800
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Generation backend
    pub backend: BackendConfig,
    /// Generator pool sizing
    pub pool: PoolConfig,
    /// Conversation memory
    pub memory: MemoryConfig,
    /// Directory artifact directories are created under
    pub output_root: PathBuf,
    /// Capacity of the caller event channel
    pub stream_buffer: usize,
}

impl ForgeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed or mistyped input.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] if the file cannot be read
    /// - [`ConfigError::Toml`] if it does not parse
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&text)
    }

    /// With backend base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// With backend model name
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.backend.model = model.into();
        self
    }

    /// With maximum cached generator instances
    #[inline]
    #[must_use]
    pub fn with_max_instances(mut self, max: u64) -> Self {
        self.pool.max_instances = max;
        self
    }

    /// With idle eviction timeout
    #[inline]
    #[must_use]
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.pool.idle_ttl_secs = ttl.map(|d| d.as_secs());
        self
    }

    /// With memory window size
    #[inline]
    #[must_use]
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.memory.max_messages = max;
        self
    }

    /// With number of history turns loaded into new instances
    #[inline]
    #[must_use]
    pub fn with_hydrate_turns(mut self, turns: usize) -> Self {
        self.memory.hydrate_turns = turns;
        self
    }

    /// With output root
    #[inline]
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// With caller channel capacity
    #[inline]
    #[must_use]
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity;
        self
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            pool: PoolConfig::default(),
            memory: MemoryConfig::default(),
            output_root: PathBuf::from("tmp/code_output"),
            stream_buffer: 64,
        }
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the model server
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Bearer token, if the server wants one
    pub api_key: Option<String>,
    /// Connect timeout; the stream itself is never timed out
    pub connect_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5-coder".to_string(),
            api_key: None,
            connect_timeout_secs: Some(10),
        }
    }
}

/// Generator pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum cached instances
    pub max_instances: u64,
    /// Evict instances unused for this long
    pub idle_ttl_secs: Option<u64>,
}

impl PoolConfig {
    /// Idle timeout as a duration
    #[must_use]
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_instances: 1000,
            idle_ttl_secs: Some(30 * 60),
        }
    }
}

/// Conversation memory settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Turns kept in an instance's window
    pub max_messages: usize,
    /// Turns loaded from history when an instance is created
    pub hydrate_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            hydrate_turns: 20,
        }
    }
}
