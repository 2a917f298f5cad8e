//! Forge Core - prompt to artifact pipeline
//!
//! The part of Forge that:
//! - Keeps one generator instance per application, with conversation memory
//! - Streams model output to the caller as it arrives
//! - Accumulates the output and persists it once the stream ends
//! - Records prompts and replies in chat history
//!
//! # Example
//!
//! ```rust,ignore
//! use forge_core::{CodeGenPipeline, ForgeConfig, GenerationRequest, JsonlHistoryStore, OllamaBackendFactory};
//! use forge_artifact::{AppId, CodeGenMode};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ForgeConfig::load("forge.toml").await?;
//! let pipeline = CodeGenPipeline::new(
//!     &config,
//!     Arc::new(OllamaBackendFactory::new(config.backend.clone())),
//!     Arc::new(JsonlHistoryStore::new("tmp/history")),
//! );
//!
//! let request = GenerationRequest::new(AppId(42), "A landing page", CodeGenMode::MultiFile);
//! let mut stream = pipeline.generate_stream(request).await?;
//! while let Some(event) = stream.next().await {
//!     print!("{}", event?.to_sse());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod generator_pool;
pub mod history;
pub mod instance;
pub mod memory;
pub mod orchestrator;
pub mod prompt;
pub mod types;

// Re-exports for convenience
pub use backend::{BackendFactory, GenerationBackend, OllamaBackend, OllamaBackendFactory, TokenStream};
pub use config::{BackendConfig, ForgeConfig, MemoryConfig, PoolConfig};
pub use error::{BackendError, ConfigError, ForgeError, HistoryError, PoolError};
pub use events::{wait_terminal, GenerationStream, PipelineState, StreamEvent};
pub use generator_pool::{GeneratorPool, PoolStats};
pub use history::{ChatHistoryStore, InMemoryHistoryStore, JsonlHistoryStore};
pub use instance::GeneratorInstance;
pub use memory::ChatMemory;
pub use orchestrator::CodeGenPipeline;
pub use prompt::system_prompt;
pub use types::{ChatMessage, ChatRole, ChatTurn, GenerationRequest, MessageRole, RequestId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Forge Core
    pub use crate::{
        ChatHistoryStore, CodeGenPipeline, ForgeConfig, ForgeError, GenerationRequest,
        GenerationStream, PipelineState, StreamEvent,
    };
    pub use forge_artifact::{AppId, CodeGenMode, UserId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
