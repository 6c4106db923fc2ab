//! # Parley - Rolling Conversation Memory for LLM Chat
//!
//! Parley keeps an LLM-backed chat session inside a context budget and pulls
//! structured personal details out of chat transcripts:
//! - Bounded message history with turn and character limits
//! - Periodic summarization that folds older messages into a running summary
//! - A single context blob for driving the next completion
//! - Schema-constrained extraction of name, email, phone, location and age
//! - Format and range validation of extracted fields
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ParleyConfig::load()?;
//!     let llm = LLMProviderFactory::create(&config.llm.unwrap_or_else(LLMProviderConfig::groq))?;
//!
//!     let mut conversation = ConversationManager::new(llm.clone(), config.conversation);
//!     conversation.add_user_message("Hi, I'm Jane from Oslo").await;
//!     println!("{}", conversation.get_context());
//!
//!     let extractor = InformationExtractor::new(llm);
//!     let record = extractor.extract_information("My name is Jane, email jane@x.com").await;
//!     let report = extractor.validate_extraction(&record);
//!     println!("{:?} valid={}", record, report.is_valid);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `llm-groq`: Groq (OpenAI-compatible) completion provider

pub mod config;
pub mod conversation;
pub mod error;
pub mod extraction;
pub mod llm;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        ConversationConfig, ExtractionConfig, LLMProvider as LLMProviderType, LLMProviderConfig,
        ParleyConfig,
    };
    pub use crate::conversation::{
        ConversationManager, ConversationMessage, ConversationStats, MessageHistory,
        SummarizationStatus, TruncationPolicy, TurnResult,
    };
    pub use crate::error::{ParleyError, Result};
    pub use crate::extraction::{
        ExtractedRecord, ExtractionField, InformationExtractor, ValidationReport,
        validate_extraction,
    };
    pub use crate::llm::{
        FunctionDefinition, LLMConfig, LLMProvider, LLMProviderFactory, LLMRequest, LLMResponse,
        Message, MessageRole, ModelInfo, TokenUsage,
    };
}
