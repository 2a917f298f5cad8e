//! Code generation pipeline
//!
//! Drives one request from prompt to artifact directory:
//! 1. Get (or create) the application's generator instance
//! 2. Start the backend stream
//! 3. Relay chunks to the caller while accumulating them
//! 4. After the caller stream closes, parse and save the full text
//!
//! Parse and save failures of a streaming request are logged and published
//! on the status channel; they never reach the caller stream.

use crate::backend::{BackendFactory, TokenStream};
use crate::config::ForgeConfig;
use crate::error::{BackendError, ForgeError};
use crate::events::{GenerationStream, PipelineState, StreamEvent};
use crate::generator_pool::GeneratorPool;
use crate::history::ChatHistoryStore;
use crate::instance::GeneratorInstance;
use crate::types::{ChatRole, GenerationRequest, RequestId};
use forge_artifact::{AppId, CodeGenMode, UserId};
use forge_codec::{CodeSaver, SavedArtifact};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// How the relay loop ended
enum RelayEnd {
    Completed,
    Failed(BackendError),
    Cancelled,
}

/// The generation-to-artifact pipeline
#[derive(Clone)]
pub struct CodeGenPipeline {
    pool: Arc<GeneratorPool>,
    saver: Arc<CodeSaver>,
    history: Arc<dyn ChatHistoryStore>,
    stream_buffer: usize,
}

impl std::fmt::Debug for CodeGenPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenPipeline")
            .field("pool", &self.pool)
            .field("saver", &self.saver)
            .field("stream_buffer", &self.stream_buffer)
            .finish_non_exhaustive()
    }
}

impl CodeGenPipeline {
    /// Create pipeline from configuration
    #[must_use]
    pub fn new(
        config: &ForgeConfig,
        factory: Arc<dyn BackendFactory>,
        history: Arc<dyn ChatHistoryStore>,
    ) -> Self {
        let pool = GeneratorPool::new(config.pool, config.memory, factory, Arc::clone(&history));
        Self::from_parts(
            Arc::new(pool),
            Arc::new(CodeSaver::new(&config.output_root)),
            history,
            config.stream_buffer,
        )
    }

    /// Create pipeline from prepared components
    #[must_use]
    pub fn from_parts(
        pool: Arc<GeneratorPool>,
        saver: Arc<CodeSaver>,
        history: Arc<dyn ChatHistoryStore>,
        stream_buffer: usize,
    ) -> Self {
        Self {
            pool,
            saver,
            history,
            stream_buffer: stream_buffer.max(1),
        }
    }

    /// Generator pool
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &GeneratorPool {
        &self.pool
    }

    /// Artifact saver
    #[inline]
    #[must_use]
    pub fn saver(&self) -> &CodeSaver {
        &self.saver
    }

    /// Generate, then parse and save; returns the artifact directory
    ///
    /// # Errors
    ///
    /// - [`ForgeError::Configuration`] if no generator can be built
    /// - [`ForgeError::Backend`] if generation fails
    /// - [`ForgeError::Parse`] / [`ForgeError::Save`] if persistence fails
    pub async fn generate_and_save(&self, request: GenerationRequest) -> Result<PathBuf, ForgeError> {
        let span = request_span(&request);
        self.run_to_completion(request).instrument(span).await
    }

    /// Generate as a live stream; parse and save after it ends
    ///
    /// # Errors
    ///
    /// - [`ForgeError::Configuration`] if no generator can be built
    /// - [`ForgeError::Backend`] if the backend call cannot be started
    pub async fn generate_stream(&self, request: GenerationRequest) -> Result<GenerationStream, ForgeError> {
        let span = request_span(&request);
        self.start_stream(request, span.clone()).instrument(span).await
    }

    async fn run_to_completion(&self, request: GenerationRequest) -> Result<PathBuf, ForgeError> {
        tracing::info!("generation started");
        let (instance, mut tokens) = self.open(&request).await?;

        let mut reply = String::new();
        while let Some(next) = tokens.next().await {
            match next {
                Ok(chunk) => reply.push_str(&chunk),
                Err(e) => {
                    self.note_failure(&request, &e).await;
                    return Err(e.into());
                }
            }
        }
        drop(tokens);

        self.finish_reply(&instance, &request, &reply).await;
        let saved = persist(&self.saver, &reply, request.mode, request.app_id).await?;
        tracing::info!(dir = %saved.root.display(), files = saved.files.len(), "generation saved");
        Ok(saved.root)
    }

    async fn start_stream(
        &self,
        request: GenerationRequest,
        span: tracing::Span,
    ) -> Result<GenerationStream, ForgeError> {
        tracing::info!("streaming generation started");
        let (instance, tokens) = self.open(&request).await?;

        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let (status_tx, status_rx) = watch::channel(PipelineState::Idle);
        status_tx.send_replace(PipelineState::Streaming);

        let relay = Relay {
            pipeline: self.clone(),
            instance,
            request,
            tx,
            status: status_tx,
        };
        tokio::spawn(relay.run(tokens).instrument(span));

        Ok(GenerationStream::new(rx, status_rx))
    }

    /// Get the instance, record the prompt and start the backend stream
    async fn open(
        &self,
        request: &GenerationRequest,
    ) -> Result<(Arc<GeneratorInstance>, TokenStream), ForgeError> {
        let instance = self.pool.get_instance(request.app_id).await?;

        if let Some(user_id) = request.user_id {
            self.record(request.app_id, &request.prompt, ChatRole::User, user_id).await;
        }

        match instance.stream(request.mode, &request.prompt).await {
            Ok(tokens) => Ok((instance, tokens)),
            Err(e) => {
                self.note_failure(request, &e).await;
                Err(e.into())
            }
        }
    }

    /// Remember a complete reply in memory and history
    async fn finish_reply(&self, instance: &GeneratorInstance, request: &GenerationRequest, reply: &str) {
        instance.record_reply(reply).await;
        if let Some(user_id) = request.user_id {
            self.record(request.app_id, reply, ChatRole::Assistant, user_id).await;
        }
    }

    async fn note_failure(&self, request: &GenerationRequest, error: &BackendError) {
        tracing::warn!(error = %error, "backend failed");
        if let Some(user_id) = request.user_id {
            let note = format!("AI reply failed: {error}");
            self.record(request.app_id, &note, ChatRole::Assistant, user_id).await;
        }
    }

    async fn record(&self, app_id: AppId, text: &str, role: ChatRole, user_id: UserId) {
        if let Err(e) = self.history.append(app_id, text, role, user_id).await {
            tracing::warn!(%app_id, ?role, error = %e, "chat history append failed");
        }
    }
}

/// Spawned relay for one streaming request
struct Relay {
    pipeline: CodeGenPipeline,
    instance: Arc<GeneratorInstance>,
    request: GenerationRequest,
    tx: mpsc::Sender<Result<StreamEvent, ForgeError>>,
    status: watch::Sender<PipelineState>,
}

impl Relay {
    async fn run(self, mut tokens: TokenStream) {
        let Self {
            pipeline,
            instance,
            request,
            tx,
            status,
        } = self;

        let mut reply = String::new();
        let mut chunks = 0usize;
        let end = loop {
            tokio::select! {
                biased;
                () = tx.closed() => break RelayEnd::Cancelled,
                next = tokens.next() => match next {
                    Some(Ok(chunk)) => {
                        reply.push_str(&chunk);
                        chunks += 1;
                        if tx.send(Ok(StreamEvent::Data(chunk))).await.is_err() {
                            break RelayEnd::Cancelled;
                        }
                    }
                    Some(Err(e)) => break RelayEnd::Failed(e),
                    None => break RelayEnd::Completed,
                },
            }
        };
        drop(tokens);

        let end = match end {
            RelayEnd::Completed => match tx.send(Ok(StreamEvent::Done)).await {
                Ok(()) => RelayEnd::Completed,
                Err(_) => RelayEnd::Cancelled,
            },
            other => other,
        };

        match end {
            RelayEnd::Cancelled => {
                drop(tx);
                tracing::info!(chunks, "caller went away, generation abandoned");
                status.send_replace(PipelineState::Cancelled);
            }
            RelayEnd::Failed(e) => {
                let reason = e.to_string();
                pipeline.note_failure(&request, &e).await;
                // Caller may already be gone; the status channel still reports it
                let _ = tx.send(Err(ForgeError::Backend(e))).await;
                drop(tx);
                status.send_replace(PipelineState::Failed(reason));
            }
            RelayEnd::Completed => {
                drop(tx);
                status.send_replace(PipelineState::Completing);
                tracing::debug!(chunks, bytes = reply.len(), "stream delivered, persisting");

                pipeline.finish_reply(&instance, &request, &reply).await;
                match persist(&pipeline.saver, &reply, request.mode, request.app_id).await {
                    Ok(saved) => {
                        tracing::info!(
                            dir = %saved.root.display(),
                            files = saved.files.len(),
                            "generation saved"
                        );
                        status.send_replace(PipelineState::Saved(saved.root));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "generated code was not saved");
                        status.send_replace(PipelineState::SaveFailed(e.to_string()));
                    }
                }
            }
        }
    }
}

/// Parse `raw` for `mode` and write it under the application's directory
async fn persist(
    saver: &CodeSaver,
    raw: &str,
    mode: CodeGenMode,
    app_id: AppId,
) -> Result<SavedArtifact, ForgeError> {
    let code = forge_codec::parse(raw, mode)?;
    Ok(saver.save(&code, mode, Some(app_id)).await?)
}

fn request_span(request: &GenerationRequest) -> tracing::Span {
    tracing::info_span!(
        "generation",
        request_id = %RequestId::new(),
        app_id = %request.app_id,
        mode = %request.mode,
    )
}
