//! Caller-visible stream events and pipeline status
//!
//! - [`StreamEvent`]: what the caller receives, renderable as SSE frames
//! - [`PipelineState`]: relay lifecycle, published on a `watch` channel
//! - [`GenerationStream`]: the caller's end of a streaming request

use crate::error::ForgeError;
use futures::Stream;
use serde::Serialize;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};

/// Event delivered to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Raw model chunk
    Data(String),
    /// Backend finished; no more data follows
    Done,
}

impl StreamEvent {
    /// SSE event type
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Data(_) => "message",
            Self::Done => "done",
        }
    }

    /// JSON payload: `{"d": chunk}` for data, `{}` for done
    #[must_use]
    pub fn envelope(&self) -> String {
        match self {
            Self::Data(chunk) => serde_json::json!({ "d": chunk }).to_string(),
            Self::Done => "{}".to_string(),
        }
    }

    /// Server-Sent-Event frame
    #[must_use]
    pub fn to_sse(&self) -> String {
        match self {
            Self::Data(_) => format!("data: {}\n\n", self.envelope()),
            Self::Done => format!("event: {}\ndata: {}\n\n", self.event_type(), self.envelope()),
        }
    }
}

/// Lifecycle of one streaming request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Not started
    #[default]
    Idle,
    /// Relaying chunks
    Streaming,
    /// Caller stream closed, parsing and saving
    Completing,
    /// Artifact written to this directory
    Saved(PathBuf),
    /// Content delivered but not persisted
    SaveFailed(String),
    /// Backend failed mid-stream
    Failed(String),
    /// Caller went away first
    Cancelled,
}

impl PipelineState {
    /// Whether no further transition happens
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Saved(_) | Self::SaveFailed(_) | Self::Failed(_) | Self::Cancelled
        )
    }
}

/// Caller end of a streaming generation
///
/// Yields `Ok(Data)` chunks in backend order followed by one `Ok(Done)`, or
/// a terminal `Err` if the backend fails. Dropping it cancels the request.
#[derive(Debug)]
pub struct GenerationStream {
    events: mpsc::Receiver<Result<StreamEvent, ForgeError>>,
    status: watch::Receiver<PipelineState>,
}

impl GenerationStream {
    pub(crate) fn new(
        events: mpsc::Receiver<Result<StreamEvent, ForgeError>>,
        status: watch::Receiver<PipelineState>,
    ) -> Self {
        Self { events, status }
    }

    /// Status side channel; outlives the event stream
    #[must_use]
    pub fn status(&self) -> watch::Receiver<PipelineState> {
        self.status.clone()
    }
}

impl Stream for GenerationStream {
    type Item = Result<StreamEvent, ForgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

/// Wait until `status` reaches a terminal state
///
/// Returns the last state seen if the relay is gone before that.
pub async fn wait_terminal(mut status: watch::Receiver<PipelineState>) -> PipelineState {
    let reached = status
        .wait_for(PipelineState::is_terminal)
        .await
        .map(|state| state.clone());
    match reached {
        Ok(state) => state,
        Err(_) => status.borrow().clone(),
    }
}
