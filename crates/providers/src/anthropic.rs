//! Anthropic Claude client using the Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chat_core::{ClientError, LlmClient, TurnRequest};

const API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API base URL.
    pub api_url: String,
    /// Model name to request.
    pub model: String,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: 1024,
        }
    }
}

impl AnthropicConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ANTHROPIC_API_URL` - API base URL (default: https://api.anthropic.com)
    /// - `ANTHROPIC_MODEL` - Model name (default: claude-3-5-haiku-20241022)
    /// - `ANTHROPIC_MAX_TOKENS` - Max tokens per reply (default: 1024)
    ///
    /// The API key is not configured here: it arrives per call with the
    /// `TurnRequest`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("ANTHROPIC_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            max_tokens: std::env::var("ANTHROPIC_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }
}

/// A message in a Messages API request.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Messages API request body.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Messages API response body.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

/// One block of response content. Only `text` blocks carry prose.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
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

/// Claude backend speaking the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Create a client with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(|e| {
            ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(AnthropicConfig::from_env())
    }

    /// Build the request body: projected history, then the prompt as the
    /// closing user message. The system prompt rides top-level.
    fn build_request(&self, request: &TurnRequest) -> MessagesRequest {
        let mut messages: Vec<Message> = request
            .history
            .iter()
            .map(|entry| Message {
                role: entry.role().to_string(),
                content: entry.text(),
            })
            .collect();
        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let system = if request.system_prompt.is_empty() {
            None
        } else {
            Some(request.system_prompt.clone())
        };

        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system,
            messages,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        let url = format!("{}/v1/messages", self.config.api_url);
        let body = self.build_request(&request);

        debug!(model = %body.model, turns = body.messages.len(), "Sending Messages API request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &request.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(ClientError::api(
                    "claude",
                    format!("({}) {}", status.as_u16(), api_error.error.message),
                ));
            }
            return Err(ClientError::api(
                "claude",
                format!("({}) {}", status.as_u16(), error_text),
            ));
        }

        let completion: MessagesResponse = response.json().await.map_err(|e| {
            ClientError::api("claude", format!("Failed to parse response: {}", e))
        })?;

        completion
            .content
            .iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text.clone())
            .ok_or_else(|| ClientError::EmptyResponse("claude".to_string()))
    }

    fn vendor(&self) -> &str {
        "claude"
    }
}
