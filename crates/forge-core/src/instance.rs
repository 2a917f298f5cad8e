//! Generator instance: one application's backend plus its memory

use crate::backend::{GenerationBackend, TokenStream};
use crate::error::BackendError;
use crate::memory::ChatMemory;
use crate::prompt::system_prompt;
use crate::types::{ChatMessage, ChatTurn};
use forge_artifact::{AppId, CodeGenMode};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stateful handle to the backend for one application
///
/// Shared as `Arc<GeneratorInstance>` between the pool and in-flight
/// requests. Concurrent requests for the same application interleave their
/// turns in memory in lock order.
pub struct GeneratorInstance {
    app_id: AppId,
    backend: Arc<dyn GenerationBackend>,
    memory: Mutex<ChatMemory>,
}

impl std::fmt::Debug for GeneratorInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorInstance")
            .field("app_id", &self.app_id)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl GeneratorInstance {
    /// Create instance with prepared memory
    #[must_use]
    pub fn new(app_id: AppId, backend: Arc<dyn GenerationBackend>, memory: ChatMemory) -> Self {
        Self {
            app_id,
            backend,
            memory: Mutex::new(memory),
        }
    }

    /// Application this instance serves
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Record `prompt` and start streaming a reply
    ///
    /// Sends the system prompt for `mode`, then the memory window, which
    /// ends with the new prompt.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the backend call cannot be started.
    pub async fn stream(&self, mode: CodeGenMode, prompt: &str) -> Result<TokenStream, BackendError> {
        let messages = {
            let mut memory = self.memory.lock().await;
            memory.push(ChatTurn::user(prompt));
            let mut messages = Vec::with_capacity(memory.len() + 1);
            messages.push(ChatMessage::system(system_prompt(mode)));
            messages.extend(memory.messages());
            messages
        };

        tracing::debug!(
            app_id = %self.app_id,
            backend = self.backend.name(),
            messages = messages.len(),
            "starting backend stream"
        );
        self.backend.stream_chat(messages).await
    }

    /// Remember a completed reply
    pub async fn record_reply(&self, text: &str) {
        self.memory.lock().await.push(ChatTurn::assistant(text));
    }

    /// Copy of the memory window
    pub async fn memory_snapshot(&self) -> Vec<ChatTurn> {
        self.memory.lock().await.turns().cloned().collect()
    }
}
