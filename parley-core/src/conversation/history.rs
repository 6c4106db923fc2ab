//! Message History Management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::MessageRole;

/// A single message held in conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who sent the message
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When the message was added
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a message stamped with the current time
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Length of the content in characters (the budget unit)
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// `ROLE: content`
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// Ordered message log, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageHistory {
    messages: Vec<ConversationMessage>,
}

impl MessageHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the newest end
    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    /// All held messages, oldest first
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Most recently added message
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Sum of content lengths in characters
    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(ConversationMessage::char_count).sum()
    }

    /// Keep only the newest `n` messages, returning how many were dropped
    pub fn keep_last(&mut self, n: usize) -> usize {
        let excess = self.messages.len().saturating_sub(n);
        self.messages.drain(..excess);
        excess
    }

    /// Remove and return the oldest message
    pub fn pop_oldest(&mut self) -> Option<ConversationMessage> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.remove(0))
        }
    }

    /// `ROLE: content` lines joined by newlines
    pub fn to_transcript(&self) -> String {
        self.messages
            .iter()
            .map(ConversationMessage::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
