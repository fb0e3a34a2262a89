//! DeepSeek client.
//!
//! DeepSeek exposes an OpenAI-compatible Chat Completions API, so this
//! module reuses the `openai` wire types and request plumbing and differs
//! only in endpoint, model, and error labeling.

use async_trait::async_trait;
use reqwest::Client;

use chat_core::{ClientError, LlmClient, TurnRequest};

use crate::openai::{build_messages, chat_completion, ChatCompletionRequest};

/// Configuration for the DeepSeek client.
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    /// API base URL.
    pub api_url: String,
    /// Model name to request.
    pub model: String,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            max_tokens: 1024,
        }
    }
}

impl DeepSeekConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `DEEPSEEK_API_URL` - API base URL (default: https://api.deepseek.com)
    /// - `DEEPSEEK_MODEL` - Model name (default: deepseek-chat)
    /// - `DEEPSEEK_MAX_TOKENS` - Max tokens per reply (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("DEEPSEEK_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("DEEPSEEK_MODEL").unwrap_or(defaults.model),
            max_tokens: std::env::var("DEEPSEEK_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }
}

/// DeepSeek backend speaking its OpenAI-compatible API.
pub struct DeepSeekClient {
    client: Client,
    config: DeepSeekConfig,
}

impl DeepSeekClient {
    /// Create a client with the given configuration.
    pub fn new(config: DeepSeekConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(|e| {
            ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(DeepSeekConfig::from_env())
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(&request),
            max_tokens: self.config.max_tokens,
        };
        chat_completion(&self.client, "deepseek", &url, &request.api_key, &body).await
    }

    fn vendor(&self) -> &str {
        "deepseek"
    }
}
