//! Generation backends
//!
//! A backend turns a list of chat messages into a stream of text chunks.
//! Chunks of one call arrive in emission order and concatenate to the full
//! reply. The pool builds one backend per application through a
//! [`BackendFactory`].

use crate::error::{BackendError, PoolError};
use crate::types::ChatMessage;
use async_trait::async_trait;
use forge_artifact::AppId;
use futures::stream::BoxStream;
use std::sync::Arc;

mod ollama;

pub use ollama::{OllamaBackend, OllamaBackendFactory};

/// Stream of reply chunks; an `Err` item ends the stream
pub type TokenStream = BoxStream<'static, Result<String, BackendError>>;

/// Streaming chat backend
#[async_trait]
pub trait GenerationBackend: Send + Sync + 'static {
    /// Start generating a reply to `messages`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the call cannot be started. Failures after
    /// the first chunk arrive as an `Err` item on the stream.
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, BackendError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Builds the backend for a new generator instance
#[async_trait]
pub trait BackendFactory: Send + Sync + 'static {
    /// Backend for `app_id`
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] when the backend settings are
    /// unusable.
    async fn build(&self, app_id: AppId) -> Result<Arc<dyn GenerationBackend>, PoolError>;
}
