//! Chat history collaborator
//!
//! The pipeline reads recent turns to hydrate new generator instances and
//! appends the prompt and the reply of attributed requests. Two stores ship
//! with the crate:
//! - [`InMemoryHistoryStore`] - process-local, for tests and ephemeral runs
//! - [`JsonlHistoryStore`] - one JSON line per turn in `{dir}/{app_id}.jsonl`

use crate::error::HistoryError;
use crate::types::{ChatRole, ChatTurn};
use async_trait::async_trait;
use forge_artifact::{AppId, UserId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Persistent chat history per application
#[async_trait]
pub trait ChatHistoryStore: Send + Sync + 'static {
    /// Up to `max_count` most recent turns of `app_id`, oldest first
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the store cannot be read.
    async fn load_recent_turns(
        &self,
        app_id: AppId,
        max_count: usize,
    ) -> Result<Vec<ChatTurn>, HistoryError>;

    /// Append a turn; `Ok(false)` when there was nothing to store
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the store cannot be written.
    async fn append(
        &self,
        app_id: AppId,
        text: &str,
        role: ChatRole,
        user_id: UserId,
    ) -> Result<bool, HistoryError>;
}

fn tail(turns: &[ChatTurn], max_count: usize) -> Vec<ChatTurn> {
    turns[turns.len().saturating_sub(max_count)..].to_vec()
}

fn stamped(text: &str, role: ChatRole, user_id: UserId) -> ChatTurn {
    let mut turn = ChatTurn::new(role, text);
    turn.user_id = Some(user_id);
    turn
}

/// History kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    turns: Mutex<HashMap<AppId, Vec<ChatTurn>>>,
}

impl InMemoryHistoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an application's history, oldest first
    pub fn seed(&self, app_id: AppId, turns: impl IntoIterator<Item = ChatTurn>) {
        self.turns.lock().entry(app_id).or_default().extend(turns);
    }

    /// Every stored turn of `app_id`
    #[must_use]
    pub fn all_turns(&self, app_id: AppId) -> Vec<ChatTurn> {
        self.turns.lock().get(&app_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryHistoryStore {
    async fn load_recent_turns(
        &self,
        app_id: AppId,
        max_count: usize,
    ) -> Result<Vec<ChatTurn>, HistoryError> {
        let turns = self.turns.lock();
        Ok(turns
            .get(&app_id)
            .map(|t| tail(t, max_count))
            .unwrap_or_default())
    }

    async fn append(
        &self,
        app_id: AppId,
        text: &str,
        role: ChatRole,
        user_id: UserId,
    ) -> Result<bool, HistoryError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.turns
            .lock()
            .entry(app_id)
            .or_default()
            .push(stamped(text, role, user_id));
        Ok(true)
    }
}

/// History persisted as JSON lines, one file per application
#[derive(Debug)]
pub struct JsonlHistoryStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlHistoryStore {
    /// Create store under `dir`; the directory is created on first append
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// History file of `app_id`
    #[must_use]
    pub fn file_for(&self, app_id: AppId) -> PathBuf {
        self.dir.join(format!("{app_id}.jsonl"))
    }

    async fn read_all(path: &Path) -> Result<Vec<ChatTurn>, HistoryError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::io_error(path, e)),
        };

        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(HistoryError::from))
            .collect()
    }
}

#[async_trait]
impl ChatHistoryStore for JsonlHistoryStore {
    async fn load_recent_turns(
        &self,
        app_id: AppId,
        max_count: usize,
    ) -> Result<Vec<ChatTurn>, HistoryError> {
        let turns = Self::read_all(&self.file_for(app_id)).await?;
        Ok(tail(&turns, max_count))
    }

    async fn append(
        &self,
        app_id: AppId,
        text: &str,
        role: ChatRole,
        user_id: UserId,
    ) -> Result<bool, HistoryError> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let mut line = serde_json::to_string(&stamped(text, role, user_id))?;
        line.push('\n');

        let path = self.file_for(app_id);
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| HistoryError::io_error(&self.dir, e))?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| HistoryError::io_error(&path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| HistoryError::io_error(&path, e))?;
        file.flush()
            .await
            .map_err(|e| HistoryError::io_error(&path, e))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(turns: &[ChatTurn]) -> Vec<&str> {
        turns.iter().map(|t| t.text.as_str()).collect()
    }

    #[tokio::test]
    async fn in_memory_returns_most_recent_oldest_first() {
        let store = InMemoryHistoryStore::new();
        for text in ["a", "b", "c", "d"] {
            store.append(AppId(1), text, ChatRole::User, UserId(5)).await.unwrap();
        }

        let recent = store.load_recent_turns(AppId(1), 2).await.unwrap();
        assert_eq!(texts(&recent), vec!["c", "d"]);
        assert!(store.load_recent_turns(AppId(2), 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_not_stored() {
        let store = InMemoryHistoryStore::new();
        let stored = store.append(AppId(1), "  ", ChatRole::Assistant, UserId(5)).await.unwrap();
        assert!(!stored);
        assert!(store.all_turns(AppId(1)).is_empty());
    }

    #[tokio::test]
    async fn jsonl_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("history"));

        store.append(AppId(7), "make a page", ChatRole::User, UserId(1)).await.unwrap();
        store.append(AppId(7), "```html\n<p></p>\n```", ChatRole::Assistant, UserId(1)).await.unwrap();
        store.append(AppId(8), "other app", ChatRole::User, UserId(2)).await.unwrap();

        let turns = store.load_recent_turns(AppId(7), 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[1].user_id, Some(UserId(1)));

        let raw = std::fs::read_to_string(store.file_for(AppId(7))).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.contains("\"role\":\"ai\""));
    }

    #[tokio::test]
    async fn jsonl_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path());
        assert!(store.load_recent_turns(AppId(1), 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn jsonl_corrupt_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path());
        std::fs::write(store.file_for(AppId(3)), "not json\n").unwrap();

        let err = store.load_recent_turns(AppId(3), 5).await.unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt(_)));
    }
}
