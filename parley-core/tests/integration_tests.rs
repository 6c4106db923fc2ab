//! Integration tests for conversation memory and field extraction
//!
//! Both components share one scripted completion service handle, the way an
//! application wires them together.

use async_trait::async_trait;
use parley_core::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Summaries are numbered per call; extraction returns a fixed payload.
/// Flip `failing` to make every call error.
struct ScriptedService {
    calls: AtomicUsize,
    structured_calls: AtomicUsize,
    failing: AtomicBool,
    payload: Value,
}

impl ScriptedService {
    fn new(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            structured_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            payload,
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMProvider for ScriptedService {
    async fn generate_request(&self, _request: &LLMRequest) -> Result<LLMResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ParleyError::Completion("service unavailable".to_string()));
        }
        Ok(LLMResponse {
            content: format!("Summary {}.", n),
            usage: None,
        })
    }

    async fn generate_structured(
        &self,
        _request: &LLMRequest,
        _function: &FunctionDefinition,
    ) -> Result<Value> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ParleyError::Completion("service unavailable".to_string()));
        }
        Ok(self.payload.clone())
    }
}

#[tokio::test]
async fn test_session_then_extraction() {
    let service = ScriptedService::new(json!({
        "name": "Jane",
        "email": "jane@x.com",
        "phone": "",
        "location": null
    }));
    let llm: Arc<dyn LLMProvider> = service.clone();

    let mut conversation = ConversationManager::new(llm.clone(), ConversationConfig::default());
    conversation.add_user_message("Hi, my name is Jane").await;
    conversation.add_assistant_message("Hello Jane!").await;
    conversation
        .add_user_message("You can reach me at jane@x.com")
        .await;

    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert_eq!(conversation.summary(), "Summary 1.");

    let extractor = InformationExtractor::new(llm);
    let record = extractor
        .extract_information("My name is Jane, email jane@x.com")
        .await;

    assert_eq!(
        record.fields(),
        vec![ExtractionField::Name, ExtractionField::Email]
    );
    let report = extractor.validate_extraction(&record);
    assert!(report.is_valid);
    assert_eq!(report.field_count, 2);
}

#[tokio::test]
async fn test_total_turns_counts_every_add() {
    let service = ScriptedService::new(json!({}));
    let config = ConversationConfig::new()
        .with_max_turns(3)
        .with_max_chars(25)
        .with_summarize_every(4);
    let mut conversation = ConversationManager::new(service.clone(), config);

    for i in 0..17 {
        if i == 8 {
            service.set_failing(true);
        }
        if i == 12 {
            service.set_failing(false);
        }
        conversation
            .add_user_message(format!("turn number {}", i))
            .await;
        assert_eq!(conversation.get_stats().total_turns, i + 1);
    }

    let stats = conversation.get_stats();
    assert_eq!(stats.total_turns, 17);
    assert!(stats.current_messages <= 3);
    assert!(stats.has_summary);
}

#[tokio::test]
async fn test_outage_degrades_gracefully() {
    let service = ScriptedService::new(json!({"name": "Jane"}));
    service.set_failing(true);

    let mut conversation = ConversationManager::new(
        service.clone(),
        ConversationConfig::new().with_summarize_every(2),
    );
    let mut statuses = Vec::new();
    for i in 0..6 {
        statuses.push(conversation.add_user_message(format!("m{}", i)).await.summarization);
    }

    // Every boundary retried and failed, nothing was compressed
    let failures = statuses
        .iter()
        .filter(|s| matches!(s, SummarizationStatus::Failed { .. }))
        .count();
    assert_eq!(failures, 3);
    assert!(conversation.summary().is_empty());
    assert_eq!(conversation.history().len(), 6);
    assert!(!conversation.get_context().contains("Previous conversation summary"));

    let extractor = InformationExtractor::new(service.clone());
    assert!(extractor.extract_information("My name is Jane").await.is_empty());
    assert_eq!(service.structured_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validation_examples() {
    let bad_email = validate_extraction(&ExtractedRecord::new().with_email("bad-email"));
    assert!(!bad_email.is_valid);
    assert_eq!(bad_email.validation_errors.len(), 1);
    assert!(bad_email.validation_errors[0].contains("bad-email"));

    assert!(!validate_extraction(&ExtractedRecord::new().with_age(200)).is_valid);

    let bad_phone = validate_extraction(&ExtractedRecord::new().with_phone("abc"));
    assert!(bad_phone.is_valid);
    assert_eq!(bad_phone.validation_errors.len(), 1);

    let report = serde_json::to_value(&bad_phone).unwrap();
    assert_eq!(report["extracted_fields"], json!(["phone"]));
}
