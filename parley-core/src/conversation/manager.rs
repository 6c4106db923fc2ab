//! Conversation Manager
//!
//! Owns the rolling message log, folds older messages into a running summary
//! every `summarize_every` turns, and enforces the turn and character budget
//! after every addition.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ConversationConfig;
use crate::error::{ParleyError, Result};
use crate::llm::{LLMProvider, LLMRequest, Message, MessageRole};

use super::history::{ConversationMessage, MessageHistory};
use super::truncation::TruncationPolicy;

/// Messages kept verbatim after a successful summarization
pub const RETAINED_AFTER_SUMMARY: usize = 2;

/// Fewer held messages than this and a summarization pass is skipped
pub const MIN_MESSAGES_TO_SUMMARIZE: usize = 2;

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize the following conversation concisely, capturing key points and context. Keep it under 200 words.";

/// What happened to the summary on a given turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummarizationStatus {
    /// The turn was not on a cadence boundary
    NotDue,
    /// On a boundary, but too few messages were held to be worth compressing
    Skipped,
    /// Summary updated and history collapsed
    Completed {
        /// Messages folded into the summary
        messages_summarized: usize,
    },
    /// The completion service failed; history and summary were left as they were
    Failed { error: String },
}

impl SummarizationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, SummarizationStatus::Completed { .. })
    }
}

/// Result of adding one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// Turn counter after this addition
    pub turn_count: usize,
    /// Summarization outcome for this turn
    pub summarization: SummarizationStatus,
    /// Messages dropped by truncation
    pub messages_truncated: usize,
}

/// Point-in-time view of the conversation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_turns: usize,
    pub current_messages: usize,
    pub total_characters: usize,
    pub has_summary: bool,
    pub summary_length: usize,
}

/// Bounded, self-summarizing conversation memory
pub struct ConversationManager {
    session_id: String,
    history: MessageHistory,
    summary: String,
    turn_count: usize,
    llm: Arc<dyn LLMProvider>,
    config: ConversationConfig,
    truncation: TruncationPolicy,
}

impl ConversationManager {
    /// Create a manager with a fresh random session id
    pub fn new(llm: Arc<dyn LLMProvider>, config: ConversationConfig) -> Self {
        Self::with_session_id(uuid::Uuid::new_v4().to_string(), llm, config)
    }

    /// Create a manager with a caller-supplied session id (used in log fields only)
    pub fn with_session_id(
        session_id: impl Into<String>,
        llm: Arc<dyn LLMProvider>,
        config: ConversationConfig,
    ) -> Self {
        let config = config.normalized();
        let truncation = TruncationPolicy::new(config.max_turns, config.max_chars);

        Self {
            session_id: session_id.into(),
            history: MessageHistory::new(),
            summary: String::new(),
            turn_count: 0,
            llm,
            config,
            truncation,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Messages currently held verbatim
    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// Accumulated summary of compressed messages (empty until the first pass)
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Messages ever added
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Add a message, summarizing on cadence boundaries and truncating afterwards.
    ///
    /// Completion failures never surface as errors here: they are logged and
    /// reported in [`TurnResult::summarization`], and the conversation carries
    /// on unsummarized until the next boundary.
    pub async fn add_message(&mut self, role: MessageRole, content: impl Into<String>) -> TurnResult {
        self.history.push(ConversationMessage::new(role, content));
        self.turn_count += 1;

        let summarization = if self.turn_count % self.config.summarize_every == 0 {
            self.summarize().await
        } else {
            SummarizationStatus::NotDue
        };

        let messages_truncated = self.truncation.apply(&mut self.history);
        if messages_truncated > 0 {
            debug!(
                session_id = %self.session_id,
                turn = self.turn_count,
                dropped = messages_truncated,
                remaining = self.history.len(),
                "Truncated conversation history"
            );
        }

        TurnResult {
            turn_count: self.turn_count,
            summarization,
            messages_truncated,
        }
    }

    pub async fn add_user_message(&mut self, content: impl Into<String>) -> TurnResult {
        self.add_message(MessageRole::User, content).await
    }

    pub async fn add_assistant_message(&mut self, content: impl Into<String>) -> TurnResult {
        self.add_message(MessageRole::Assistant, content).await
    }

    /// Run a summarization pass now, regardless of cadence
    pub async fn summarize(&mut self) -> SummarizationStatus {
        if self.history.len() < MIN_MESSAGES_TO_SUMMARIZE {
            debug!(
                session_id = %self.session_id,
                turn = self.turn_count,
                held = self.history.len(),
                "Skipping summarization, not enough messages"
            );
            return SummarizationStatus::Skipped;
        }

        let transcript = self.history.to_transcript();
        match self.generate_summary(&transcript).await {
            Ok(fragment) => {
                if self.summary.is_empty() {
                    self.summary = fragment;
                } else {
                    self.summary = format!("{}\n\nRecent conversation: {}", self.summary, fragment);
                }

                let messages_summarized = self.history.len();
                self.history.keep_last(RETAINED_AFTER_SUMMARY);

                info!(
                    session_id = %self.session_id,
                    turn = self.turn_count,
                    messages_summarized,
                    summary_length = self.summary.chars().count(),
                    "Summarization completed"
                );
                SummarizationStatus::Completed { messages_summarized }
            }
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    turn = self.turn_count,
                    error = %e,
                    "Summarization failed, keeping history unsummarized"
                );
                SummarizationStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn generate_summary(&self, transcript: &str) -> Result<String> {
        let request = LLMRequest::with_system_prompt(
            SUMMARY_SYSTEM_PROMPT,
            format!("Conversation to summarize:\n{}", transcript),
        )
        .temperature(self.config.summary_temperature)
        .max_tokens(self.config.summary_max_tokens);

        let response = self.llm.generate_request(&request).await?;
        let summary = response.content.trim();
        if summary.is_empty() {
            return Err(ParleyError::MalformedResponse(
                "Completion service returned an empty summary".to_string(),
            ));
        }

        Ok(summary.to_string())
    }

    /// Summary block (if any) followed by the remaining messages as `ROLE: content` lines
    pub fn get_context(&self) -> String {
        let mut parts = Vec::with_capacity(self.history.len() + 2);

        if !self.summary.is_empty() {
            parts.push(format!("Previous conversation summary:\n{}\n", self.summary));
        }

        parts.push("Current conversation:".to_string());
        parts.extend(
            self.history
                .messages()
                .iter()
                .map(ConversationMessage::transcript_line),
        );

        parts.join("\n")
    }

    /// System prompt plus the context blob, ready to send for the next reply
    pub fn context_messages(&self, system_prompt: &str) -> Vec<Message> {
        vec![Message::system(system_prompt), Message::user(self.get_context())]
    }

    pub fn get_stats(&self) -> ConversationStats {
        ConversationStats {
            total_turns: self.turn_count,
            current_messages: self.history.len(),
            total_characters: self.history.total_chars(),
            has_summary: !self.summary.is_empty(),
            summary_length: self.summary.chars().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies with scripted outcomes in order, then "default summary"
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<LLMRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default summary".to_string()));
            reply.map(|content| LLMResponse {
                content,
                usage: None,
            })
        }
    }

    fn manager(provider: &Arc<ScriptedProvider>, config: ConversationConfig) -> ConversationManager {
        ConversationManager::with_session_id("test", provider.clone(), config)
    }

    fn contents(manager: &ConversationManager) -> Vec<String> {
        manager
            .history()
            .messages()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_no_call_below_cadence() {
        let provider = ScriptedProvider::new(vec![]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(3));

        let first = manager.add_user_message("Hello").await;
        let second = manager.add_assistant_message("Hi there!").await;

        assert_eq!(first.summarization, SummarizationStatus::NotDue);
        assert_eq!(second.summarization, SummarizationStatus::NotDue);
        assert_eq!(provider.call_count(), 0);
        assert_eq!(manager.history().len(), 2);
    }

    #[tokio::test]
    async fn test_summarizes_on_cadence() {
        let provider = ScriptedProvider::new(vec![Ok("  User greeted the assistant.  ".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(3));

        manager.add_user_message("Hello").await;
        manager.add_assistant_message("Hi there!").await;
        let result = manager.add_user_message("What's the weather?").await;

        assert_eq!(
            result.summarization,
            SummarizationStatus::Completed {
                messages_summarized: 3
            }
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(manager.summary(), "User greeted the assistant.");
        assert_eq!(contents(&manager), vec!["Hi there!", "What's the weather?"]);
    }

    #[tokio::test]
    async fn test_summary_request_shape() {
        let provider = ScriptedProvider::new(vec![Ok("summary".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(2));

        manager.add_user_message("My name is Jane").await;
        manager.add_assistant_message("Nice to meet you, Jane").await;

        let requests = provider.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.contains("under 200 words"));
        assert_eq!(
            request.messages[1].content,
            "Conversation to summarize:\nUSER: My name is Jane\nASSISTANT: Nice to meet you, Jane"
        );
    }

    #[tokio::test]
    async fn test_summary_accumulates() {
        let provider = ScriptedProvider::new(vec![Ok("First.".into()), Ok("Second.".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(2));

        for i in 0..4 {
            manager.add_user_message(format!("message {}", i)).await;
        }

        assert_eq!(provider.call_count(), 2);
        assert_eq!(manager.summary(), "First.\n\nRecent conversation: Second.");
    }

    #[tokio::test]
    async fn test_skip_with_single_message() {
        let provider = ScriptedProvider::new(vec![]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(1));

        let result = manager.add_user_message("Hello").await;

        assert_eq!(result.summarization, SummarizationStatus::Skipped);
        assert_eq!(provider.call_count(), 0);
        assert!(manager.summary().is_empty());
    }

    #[tokio::test]
    async fn test_failure_leaves_state_untouched() {
        let provider = ScriptedProvider::new(vec![
            Ok("Earlier summary.".into()),
            Err(ParleyError::Completion("503 Service Unavailable".into())),
        ]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(3));

        for i in 0..5 {
            manager.add_user_message(format!("message {}", i)).await;
        }
        let summary_before = manager.summary().to_string();
        let mut history_before = manager.history().clone();

        let result = manager.add_user_message("message 5").await;
        history_before.push(manager.history().last().unwrap().clone());

        assert!(matches!(result.summarization, SummarizationStatus::Failed { ref error } if error.contains("503")));
        assert_eq!(manager.summary(), summary_before);
        assert_eq!(manager.history(), &history_before);
        assert_eq!(manager.turn_count(), 6);
    }

    #[tokio::test]
    async fn test_failure_retries_at_next_boundary() {
        let provider = ScriptedProvider::new(vec![
            Err(ParleyError::Completion("timeout".into())),
            Ok("Recovered.".into()),
        ]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(2));

        manager.add_user_message("a").await;
        let failed = manager.add_user_message("b").await;
        manager.add_user_message("c").await;
        let recovered = manager.add_user_message("d").await;

        assert!(matches!(failed.summarization, SummarizationStatus::Failed { .. }));
        assert!(recovered.summarization.is_completed());
        assert_eq!(manager.summary(), "Recovered.");
        assert_eq!(contents(&manager), vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_empty_summary_counts_as_failure() {
        let provider = ScriptedProvider::new(vec![Ok("   ".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(2));

        manager.add_user_message("a").await;
        let result = manager.add_user_message("b").await;

        assert!(matches!(result.summarization, SummarizationStatus::Failed { .. }));
        assert!(manager.summary().is_empty());
        assert_eq!(manager.history().len(), 2);
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let provider = ScriptedProvider::new(vec![]);
        let config = ConversationConfig::new()
            .with_max_turns(3)
            .with_summarize_every(100);
        let mut manager = manager(&provider, config);

        for i in 0..5 {
            manager.add_user_message(format!("{}", i)).await;
        }

        assert_eq!(contents(&manager), vec!["2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_char_limit_keeps_sole_oversized_message() {
        let provider = ScriptedProvider::new(vec![]);
        let config = ConversationConfig::new()
            .with_max_chars(10)
            .with_summarize_every(100);
        let mut manager = manager(&provider, config);

        manager.add_user_message("aaaaa").await;
        manager.add_user_message("bbbbb").await;
        let result = manager.add_user_message("ccccc").await;
        assert_eq!(result.messages_truncated, 1);
        assert_eq!(contents(&manager), vec!["bbbbb", "ccccc"]);

        manager.add_user_message("a very long message over budget").await;
        assert_eq!(contents(&manager), vec!["a very long message over budget"]);
    }

    #[tokio::test]
    async fn test_budget_invariants_hold_after_every_add() {
        let provider = ScriptedProvider::new(vec![]);
        let config = ConversationConfig::new()
            .with_max_turns(4)
            .with_max_chars(40)
            .with_summarize_every(5);
        let mut manager = manager(&provider, config);

        for i in 0..30 {
            let content = "x".repeat((i * 7) % 23 + 1);
            manager
                .add_message(
                    if i % 2 == 0 {
                        MessageRole::User
                    } else {
                        MessageRole::Assistant
                    },
                    content.clone(),
                )
                .await;

            let history = manager.history();
            assert!(history.len() <= 4);
            assert!(history.total_chars() <= 40 || history.len() == 1);
            assert_eq!(history.last().unwrap().content, content);
        }

        assert_eq!(manager.get_stats().total_turns, 30);
    }

    #[tokio::test]
    async fn test_history_bounded_after_summary() {
        let provider = ScriptedProvider::new(vec![]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(4));

        for i in 0..8 {
            let result = manager.add_user_message(format!("m{}", i)).await;
            if result.summarization.is_completed() {
                assert!(manager.history().len() <= RETAINED_AFTER_SUMMARY);
                assert!(!manager.summary().is_empty());
            }
        }
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_context_without_summary() {
        let provider = ScriptedProvider::new(vec![]);
        let mut manager = manager(&provider, ConversationConfig::default());

        manager.add_user_message("Hi").await;
        manager.add_assistant_message("Hello!").await;

        assert_eq!(
            manager.get_context(),
            "Current conversation:\nUSER: Hi\nASSISTANT: Hello!"
        );
    }

    #[tokio::test]
    async fn test_context_with_summary() {
        let provider = ScriptedProvider::new(vec![Ok("Jane introduced herself.".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(3));

        manager.add_user_message("I'm Jane").await;
        manager.add_assistant_message("Hi Jane").await;
        manager.add_user_message("I live in Oslo").await;

        assert_eq!(
            manager.get_context(),
            "Previous conversation summary:\nJane introduced herself.\n\nCurrent conversation:\nASSISTANT: Hi Jane\nUSER: I live in Oslo"
        );

        let messages = manager.context_messages("You are helpful");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, manager.get_context());
    }

    #[tokio::test]
    async fn test_stats() {
        let provider = ScriptedProvider::new(vec![Ok("Sum".into())]);
        let mut manager = manager(&provider, ConversationConfig::new().with_summarize_every(3));

        let stats = manager.get_stats();
        assert_eq!(stats.total_turns, 0);
        assert!(!stats.has_summary);

        manager.add_user_message("héllo").await;
        manager.add_assistant_message("hi").await;
        manager.add_user_message("bye").await;

        let stats = manager.get_stats();
        assert_eq!(stats.total_turns, 3);
        assert_eq!(stats.current_messages, 2);
        assert_eq!(stats.total_characters, 5);
        assert!(stats.has_summary);
        assert_eq!(stats.summary_length, 3);
    }

    #[test]
    fn test_zero_config_is_normalized() {
        let provider = ScriptedProvider::new(vec![]);
        let config = ConversationConfig {
            max_turns: 0,
            summarize_every: 0,
            ..Default::default()
        };
        let manager = ConversationManager::new(provider, config);
        assert_eq!(manager.config().summarize_every, 1);
        assert_eq!(manager.config().max_turns, 1);
        assert!(!manager.session_id().is_empty());
    }
}
