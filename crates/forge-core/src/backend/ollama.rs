//! Ollama-compatible chat backend
//!
//! Posts to `{base_url}/api/chat` with `stream: true`. The server answers
//! with newline-delimited JSON objects:
//!
//! ```text
//! {"message":{"role":"assistant","content":"```html"},"done":false}
//! {"message":{"role":"assistant","content":"\n<h1>"},"done":false}
//! {"done":true}
//! ```
//!
//! An object carrying `error` ends the stream with [`BackendError::Remote`].
//! A body that ends before the `done` object yields [`BackendError::Protocol`].

use super::{BackendFactory, GenerationBackend, TokenStream};
use crate::config::BackendConfig;
use crate::error::{BackendError, PoolError};
use crate::types::ChatMessage;
use async_trait::async_trait;
use forge_artifact::AppId;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// What one decoded line means for the stream
#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Chunk(String),
    Skip,
    Done,
}

fn decode_line(line: &str) -> Result<LineOutcome, BackendError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Skip);
    }
    let chunk: ChatChunk = serde_json::from_str(line)
        .map_err(|e| BackendError::Protocol(format!("bad chunk {line:?}: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(BackendError::Remote(error));
    }
    if chunk.done {
        return Ok(LineOutcome::Done);
    }
    match chunk.message {
        Some(message) if !message.content.is_empty() => Ok(LineOutcome::Chunk(message.content)),
        _ => Ok(LineOutcome::Skip),
    }
}

/// Streaming client for one model
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OllamaBackend {
    /// Create backend from settings
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] for an empty model name, a base
    /// URL without an http(s) scheme, or an HTTP client that cannot be built.
    pub fn from_config(config: &BackendConfig) -> Result<Self, PoolError> {
        let model = config.model.trim();
        if model.is_empty() {
            return Err(PoolError::Configuration("model name is empty".to_string()));
        }

        let base_url = config.base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(base_url).map_err(|e| {
            PoolError::Configuration(format!("invalid base url {base_url:?}: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PoolError::Configuration(format!(
                "base url {base_url:?} must use http or https"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PoolError::Configuration(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}/api/chat"),
            model: model.to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Chat endpoint URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "backend stream opened");

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut pending: Vec<u8> = Vec::new();
            let mut finished = false;
            'read: while let Some(next) = bytes.next().await {
                let data = match next {
                    Ok(data) => data,
                    Err(e) => {
                        yield Err(BackendError::Http(e));
                        return;
                    }
                };
                pending.extend_from_slice(&data);

                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    match decode_line(&String::from_utf8_lossy(&line)) {
                        Ok(LineOutcome::Chunk(text)) => yield Ok(text),
                        Ok(LineOutcome::Skip) => {}
                        Ok(LineOutcome::Done) => {
                            finished = true;
                            break 'read;
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            // Final object may arrive without a trailing newline
            if !finished && !pending.is_empty() {
                match decode_line(&String::from_utf8_lossy(&pending)) {
                    Ok(LineOutcome::Chunk(text)) => yield Ok(text),
                    Ok(LineOutcome::Skip) => {}
                    Ok(LineOutcome::Done) => finished = true,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            // A body that closes without the done object is a cut generation
            if !finished {
                yield Err(BackendError::Protocol("stream ended before done".to_string()));
            }
        };

        Ok(stream.boxed())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Builds an [`OllamaBackend`] per application from shared settings
#[derive(Debug, Clone)]
pub struct OllamaBackendFactory {
    config: BackendConfig,
}

impl OllamaBackendFactory {
    /// Create factory
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendFactory for OllamaBackendFactory {
    async fn build(&self, app_id: AppId) -> Result<Arc<dyn GenerationBackend>, PoolError> {
        let backend = OllamaBackend::from_config(&self.config)?;
        tracing::debug!(%app_id, endpoint = %backend.endpoint(), "built ollama backend");
        Ok(Arc::new(backend))
    }
}
