//! Windowed conversation memory

use crate::types::{ChatMessage, ChatTurn};
use std::collections::VecDeque;

/// Most recent turns of one application's conversation
///
/// Holds at most `max_messages` turns; pushing past the window drops the
/// oldest turn.
#[derive(Debug, Clone)]
pub struct ChatMemory {
    turns: VecDeque<ChatTurn>,
    max_messages: usize,
}

impl ChatMemory {
    /// Create empty memory
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_messages.min(64)),
            max_messages,
        }
    }

    /// Create memory from historical turns, oldest first
    #[must_use]
    pub fn hydrated(max_messages: usize, turns: impl IntoIterator<Item = ChatTurn>) -> Self {
        let mut memory = Self::new(max_messages);
        for turn in turns {
            memory.push(turn);
        }
        memory
    }

    /// Append a turn
    pub fn push(&mut self, turn: ChatTurn) {
        if self.max_messages == 0 {
            return;
        }
        while self.turns.len() >= self.max_messages {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Turns in order
    pub fn turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    /// Backend messages in order
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(ChatTurn::to_message).collect()
    }

    /// Number of turns held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns are held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Window size
    #[inline]
    #[must_use]
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRole;

    #[test]
    fn memory_window_drops_oldest() {
        let mut memory = ChatMemory::new(2);
        memory.push(ChatTurn::user("one"));
        memory.push(ChatTurn::assistant("two"));
        memory.push(ChatTurn::user("three"));

        let texts: Vec<&str> = memory.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn hydrated_keeps_order() {
        let memory = ChatMemory::hydrated(
            10,
            vec![ChatTurn::user("q"), ChatTurn::assistant("a")],
        );
        assert_eq!(memory.len(), 2);
        let roles: Vec<ChatRole> = memory.turns().map(|t| t.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
    }

    #[test]
    fn zero_window_holds_nothing() {
        let mut memory = ChatMemory::new(0);
        memory.push(ChatTurn::user("ignored"));
        assert!(memory.is_empty());
    }
}
