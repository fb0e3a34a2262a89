//! OpenAI ChatGPT client using the Chat Completions API.
//!
//! The wire types here are shared with the `deepseek` module, whose API is
//! Chat Completions-compatible.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chat_core::{ClientError, LlmClient, TurnRequest};

/// Configuration for the OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL.
    pub api_url: String,
    /// Model name to request.
    pub model: String,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini-2024-07-18".to_string(),
            max_tokens: 5000,
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API base URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Model name (default: gpt-4o-mini-2024-07-18)
    /// - `OPENAI_MAX_TOKENS` - Max tokens per reply (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("OPENAI_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// Response message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Content (may be null for refusals or tool calls)
    pub content: Option<String>,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    pub message: String,
}

/// Assemble the messages array: optional leading system message, the
/// projected history, then the prompt as the closing user message.
pub(crate) fn build_messages(request: &TurnRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage::system(request.system_prompt.clone()));
    }
    for entry in &request.history {
        messages.push(ChatMessage {
            role: entry.role().to_string(),
            content: entry.text(),
        });
    }
    messages.push(ChatMessage::user(request.prompt.clone()));
    messages
}

/// POST a chat completion and extract the reply text.
///
/// Shared by the OpenAI and DeepSeek adapters; `vendor` only labels
/// errors.
pub(crate) async fn chat_completion(
    client: &Client,
    vendor: &str,
    url: &str,
    api_key: &str,
    body: &ChatCompletionRequest,
) -> Result<String, ClientError> {
    debug!(%vendor, model = %body.model, turns = body.messages.len(), "Sending chat completion request");

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(body)
        .send()
        .await
        .map_err(|e| ClientError::Network(format!("Failed to send request: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
            return Err(ClientError::api(
                vendor,
                format!("({}) {}", status.as_u16(), api_error.error.message),
            ));
        }
        return Err(ClientError::api(
            vendor,
            format!("({}) {}", status.as_u16(), error_text),
        ));
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ClientError::api(vendor, format!("Failed to parse response: {}", e)))?;

    completion
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or_else(|| ClientError::EmptyResponse(vendor.to_string()))
}

/// ChatGPT backend speaking the OpenAI Chat Completions API.
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(|e| {
            ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(OpenAiConfig::from_env())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(&request),
            max_tokens: self.config.max_tokens,
        };
        chat_completion(&self.client, "chatgpt", &url, &request.api_key, &body).await
    }

    fn vendor(&self) -> &str {
        "chatgpt"
    }
}
