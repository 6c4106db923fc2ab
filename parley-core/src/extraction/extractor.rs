//! LLM-backed personal information extractor

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::llm::{LLMProvider, LLMRequest};

use super::schema::{ExtractedRecord, extraction_function};
use super::validation::{ValidationReport, validate_extraction};

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert at extracting personal information from chat conversations.
Extract any mentioned name, email, phone, location, and age from the provided chat.
Only extract information that is explicitly mentioned. Use null for missing information."#;

/// Extracts name, email, phone, location and age from raw chat text by forcing
/// the completion service to call a schema-described function.
pub struct InformationExtractor {
    llm: Arc<dyn LLMProvider>,
    config: ExtractionConfig,
}

impl InformationExtractor {
    /// Create with default sampling settings
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self::with_config(llm, ExtractionConfig::default())
    }

    pub fn with_config(llm: Arc<dyn LLMProvider>, config: ExtractionConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract fields from `chat_text`, degrading to an empty record on any failure
    pub async fn extract_information(&self, chat_text: &str) -> ExtractedRecord {
        match self.try_extract(chat_text).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Information extraction failed, returning empty record");
                ExtractedRecord::default()
            }
        }
    }

    /// Extract fields from `chat_text`, surfacing completion and parse errors
    ///
    /// # Errors
    ///
    /// Returns an error if the completion service fails or its payload is not
    /// a JSON object.
    pub async fn try_extract(&self, chat_text: &str) -> Result<ExtractedRecord> {
        let request = LLMRequest::with_system_prompt(
            EXTRACTION_SYSTEM_PROMPT,
            format!("Extract information from this chat:\n{}", chat_text),
        )
        .temperature(self.config.temperature)
        .max_tokens(self.config.max_tokens);

        let payload = self
            .llm
            .generate_structured(&request, &extraction_function())
            .await?;
        let record = ExtractedRecord::from_payload(payload)?;

        debug!(fields = ?record.fields(), "Extracted information");
        Ok(record)
    }

    /// See [`validate_extraction`]
    pub fn validate_extraction(&self, record: &ExtractedRecord) -> ValidationReport {
        validate_extraction(record)
    }
}
