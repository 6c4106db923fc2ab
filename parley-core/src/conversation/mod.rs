//! Conversation Memory
//!
//! A bounded, self-summarizing history buffer that keeps a chat session within
//! a context budget.
//!
//! # Features
//!
//! - Message history with per-message timestamps
//! - Periodic summarization through the completion service
//! - Turn and character budget truncation, oldest first
//! - A single context blob for driving the next completion
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_core::conversation::ConversationManager;
//! use parley_core::config::ConversationConfig;
//!
//! let mut manager = ConversationManager::new(llm, ConversationConfig::default());
//! manager.add_user_message("Hello!").await;
//! manager.add_assistant_message("Hi there! How can I help?").await;
//!
//! let context = manager.get_context();
//! ```

mod history;
mod manager;
mod truncation;

pub use history::{ConversationMessage, MessageHistory};
pub use manager::{
    ConversationManager, ConversationStats, SummarizationStatus, TurnResult,
    MIN_MESSAGES_TO_SUMMARIZE, RETAINED_AFTER_SUMMARY,
};
pub use truncation::TruncationPolicy;
