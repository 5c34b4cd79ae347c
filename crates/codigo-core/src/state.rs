//! UI-agnostic conversation state types
//!
//! These are shared between the session logic and whatever front-end drives
//! it, and don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of turns kept in the history window (5 exchanges).
pub const HISTORY_LIMIT: usize = 10;

/// One turn of the conversation, as sent back to the answering service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat turn sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Sliding window over the most recent turns.
///
/// Appending past [`HISTORY_LIMIT`] evicts the oldest turns first. Relative
/// order of the surviving turns is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: VecDeque<ChatTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    /// Record a completed exchange, then trim to the window.
    pub fn push_exchange(&mut self, question: &str, answer: &str) {
        self.push(ChatTurn::user(question));
        self.push(ChatTurn::assistant(answer));
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > HISTORY_LIMIT {
            self.turns.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn to_vec(&self) -> Vec<ChatTurn> {
        self.turns.iter().cloned().collect()
    }
}
