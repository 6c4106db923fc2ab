//! Groq LLM provider implementation
//!
//! Speaks the OpenAI-compatible chat-completions protocol, so it also works
//! against any compatible endpoint via [`GroqProvider::with_base_url`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ParleyError, Result};
use crate::llm::{
    FunctionDefinition, LLMProvider, LLMRequest, LLMResponse, ModelInfo, TokenUsage,
};

/// Default Groq API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model when neither the caller nor `GROQ_MODEL` names one
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq LLM provider (fast, cost-effective, recommended for most use cases).
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqProvider {
    /// Create a new Groq provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Groq API key
    /// * `model` - Model name (e.g., "llama-3.3-70b-versatile")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create against a custom OpenAI-compatible endpoint.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables.
    ///
    /// Reads from:
    /// - `GROQ_API_KEY` - API key (required)
    /// - `GROQ_MODEL` - Model name (optional, defaults to "llama-3.3-70b-versatile")
    /// - `GROQ_BASE_URL` - Endpoint override (optional)
    ///
    /// # Arguments
    ///
    /// * `model` - Model name (overrides GROQ_MODEL if provided)
    ///
    /// # Errors
    ///
    /// Returns an error if GROQ_API_KEY is not set.
    pub fn from_env(model: Option<impl Into<String>>) -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| {
            ParleyError::Configuration("GROQ_API_KEY environment variable not set".to_string())
        })?;

        let model = model
            .map(|m| m.into())
            .or_else(|| std::env::var("GROQ_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::with_base_url(api_key, model, base_url))
    }

    /// Point an existing provider at a different endpoint.
    pub fn with_endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ParleyError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(self)
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, request: &LLMRequest) -> GroqRequest {
        GroqRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| GroqMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: if request.stop_sequences.is_empty() {
                None
            } else {
                Some(request.stop_sequences.clone())
            },
            tools: None,
            tool_choice: None,
        }
    }

    /// Plain request plus a single tool the model is forced to call
    fn build_structured_request(
        &self,
        request: &LLMRequest,
        function: &FunctionDefinition,
    ) -> GroqRequest {
        let mut body = self.build_request(request);
        body.tools = Some(vec![GroqTool {
            kind: "function",
            function: function.clone(),
        }]);
        body.tool_choice = Some(GroqToolChoice {
            kind: "function",
            function: GroqToolChoiceFunction {
                name: function.name.clone(),
            },
        });
        body
    }

    async fn send(&self, body: &GroqRequest) -> Result<GroqResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ParleyError::Completion(format!("Failed to send request to Groq: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ParleyError::Completion(format!(
                "Groq API error ({}): {}",
                status, text
            )));
        }

        response.json().await.map_err(|e| {
            ParleyError::MalformedResponse(format!("Failed to parse Groq response: {}", e))
        })
    }
}

#[derive(Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GroqTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<GroqToolChoice>,
}

#[derive(Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct GroqTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition,
}

#[derive(Serialize)]
struct GroqToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
    function: GroqToolChoiceFunction,
}

#[derive(Serialize)]
struct GroqToolChoiceFunction {
    name: String,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessageResponse,
}

#[derive(Deserialize)]
struct GroqMessageResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<GroqToolCall>>,
}

#[derive(Deserialize)]
struct GroqToolCall {
    function: GroqFunctionCall,
}

#[derive(Deserialize)]
struct GroqFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct GroqUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl GroqResponse {
    fn into_first_message(self) -> Result<GroqMessageResponse> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ParleyError::Completion("Groq API returned no choices".to_string()))
    }
}

#[async_trait]
impl LLMProvider for GroqProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        let groq_response = self.send(&self.build_request(request)).await?;

        let usage = groq_response.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let message = groq_response.into_first_message()?;

        Ok(LLMResponse {
            content: message.content.unwrap_or_default(),
            usage,
        })
    }

    async fn generate_structured(
        &self,
        request: &LLMRequest,
        function: &FunctionDefinition,
    ) -> Result<serde_json::Value> {
        let body = self.build_structured_request(request, function);
        let message = self.send(&body).await?.into_first_message()?;
        parse_tool_arguments(message, &function.name)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "groq".to_string(),
            model_name: self.model.clone(),
        }
    }
}

fn parse_tool_arguments(
    message: GroqMessageResponse,
    function_name: &str,
) -> Result<serde_json::Value> {
    let call = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .find(|c| c.function.name == function_name)
        .ok_or_else(|| {
            ParleyError::MalformedResponse(format!(
                "Groq response did not call `{}`",
                function_name
            ))
        })?;

    serde_json::from_str(&call.function.arguments).map_err(|e| {
        ParleyError::MalformedResponse(format!("Invalid function arguments: {}", e))
    })
}
