//! Testing utilities for Forge workspace
//!
//! Shared test backends, fixtures, and pipeline setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use forge_artifact::AppId;
use forge_core::{
    BackendError, BackendFactory, ChatHistoryStore, ChatMessage, CodeGenPipeline, ForgeConfig,
    ForgeError, GenerationBackend, GenerationStream, PoolError, StreamEvent, TokenStream,
};
use futures::StreamExt;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Chunks of the multi-file example: an html block and a css block
pub const SIX_CHUNKS: [&str; 6] = [
    "```html\n",
    "<h1>Hi</h1>\n",
    "```\n",
    "```css\n",
    "h1{color:red}\n",
    "```\n",
];

pub fn sample_multi_file_chunks() -> Vec<String> {
    SIX_CHUNKS.iter().map(|c| (*c).to_string()).collect()
}

pub fn sample_single_page_chunks() -> Vec<String> {
    ["Here you go:\n\n", "```html\n<!DOCTYPE html>\n", "<p>hello</p>\n", "```\n", "Enjoy."]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

/// Sets a flag when the backend stream is dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Backend that replays a fixed script
///
/// Clones share the recorded calls and the drop flag.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    chunks: Vec<String>,
    fail_at: Option<(usize, String)>,
    stall_at: Option<usize>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    stream_dropped: Arc<AtomicBool>,
}

impl ScriptedBackend {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    /// Emit an error instead of chunk `index` and end the stream
    #[must_use]
    pub fn failing_at(mut self, index: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((index, message.into()));
        self
    }

    /// Never produce chunk `index`; the stream stays open forever
    #[must_use]
    pub fn stalling_at(mut self, index: usize) -> Self {
        self.stall_at = Some(index);
        self
    }

    /// Message lists received, one per call
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().clone()
    }

    /// Whether a stream handed out by this backend has been dropped
    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, BackendError> {
        self.calls.lock().push(messages);

        let chunks = self.chunks.clone();
        let fail_at = self.fail_at.clone();
        let stall_at = self.stall_at;
        let flag = DropFlag(Arc::clone(&self.stream_dropped));

        let stream = async_stream::stream! {
            let _flag = flag;
            for index in 0..=chunks.len() {
                if stall_at == Some(index) {
                    futures::future::pending::<()>().await;
                }
                if let Some((at, message)) = &fail_at {
                    if *at == index {
                        yield Err(BackendError::Remote(message.clone()));
                        return;
                    }
                }
                let Some(chunk) = chunks.get(index) else {
                    break;
                };
                tokio::task::yield_now().await;
                yield Ok(chunk.clone());
            }
        };
        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Factory handing out clones of one scripted backend
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    backend: ScriptedBackend,
    delay: Option<Duration>,
    failure: Option<String>,
    builds: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Sleep before each build
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every build with a configuration error
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of builds so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// The backend clones share state with
    pub fn backend(&self) -> &ScriptedBackend {
        &self.backend
    }
}

#[async_trait]
impl BackendFactory for ScriptedFactory {
    async fn build(&self, _app_id: AppId) -> Result<Arc<dyn GenerationBackend>, PoolError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(PoolError::Configuration(message.clone()));
        }
        Ok(Arc::new(self.backend.clone()))
    }
}

pub fn setup_test_pipeline(
    output_root: &Path,
    factory: Arc<ScriptedFactory>,
    history: Arc<dyn ChatHistoryStore>,
) -> CodeGenPipeline {
    let config = ForgeConfig::new().with_output_root(output_root).with_stream_buffer(4);
    CodeGenPipeline::new(&config, factory, history)
}

/// Drain a stream, keeping every item
pub async fn collect_events(stream: GenerationStream) -> Vec<Result<StreamEvent, ForgeError>> {
    stream.collect().await
}
