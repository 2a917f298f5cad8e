//! Core types for the pipeline
//!
//! - Generation requests and their ids
//! - Chat turns as stored in history
//! - Chat messages as sent to a backend

use chrono::{DateTime, Utc};
use forge_artifact::{AppId, CodeGenMode, UserId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique request identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Ulid);

impl RequestId {
    /// Generate new request ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Application the artifact belongs to
    pub app_id: AppId,
    /// Free-text prompt
    pub prompt: String,
    /// Shape of the artifact
    pub mode: CodeGenMode,
    /// Principal history writes are attributed to
    pub user_id: Option<UserId>,
}

impl GenerationRequest {
    /// Create anonymous request
    #[must_use]
    pub fn new(app_id: AppId, prompt: impl Into<String>, mode: CodeGenMode) -> Self {
        Self {
            app_id,
            prompt: prompt.into(),
            mode,
            user_id: None,
        }
    }

    /// With authenticated principal
    #[inline]
    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Author of a stored turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatRole {
    /// The person prompting
    #[serde(rename = "user")]
    User,
    /// The model
    #[serde(rename = "ai")]
    Assistant,
}

/// A turn as kept in chat history and instance memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author
    pub role: ChatRole,
    /// Message text
    pub text: String,
    /// Principal who caused the turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// When the turn was recorded
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped now
    #[must_use]
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            user_id: None,
            created_at: Utc::now(),
        }
    }

    /// Turn written by the user
    #[inline]
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    /// Turn written by the model
    #[inline]
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    /// Backend message for this turn
    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        let role = match self.role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        };
        ChatMessage::new(role, self.text.clone())
    }
}

/// Role on the backend wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model
    System,
    /// Prompt
    User,
    /// Prior model output
    Assistant,
}

/// A message sent to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role
    pub role: MessageRole,
    /// Text
    pub content: String,
}

impl ChatMessage {
    /// Create message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}
