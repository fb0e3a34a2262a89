//! Google Gemini client using the `generateContent` API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chat_core::{ClientError, LlmClient, TurnRequest};

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub api_url: String,
    /// Model name to request.
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API base URL (default: https://generativelanguage.googleapis.com/v1beta)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.5-flash-preview-05-20)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("GEMINI_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
        }
    }
}

/// One piece of content: a role plus text parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A content part. Replies may carry non-text parts; those have no `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<Content>,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// A response candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
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

/// Gemini backend speaking the `generateContent` API.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(|e| {
            ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(GeminiConfig::from_env())
    }

    /// Build the request body. The history arrives already in Gemini's
    /// vocabulary (`model`/`user` roles, parts-wrapped text); the prompt
    /// closes the contents as a user entry, and the system prompt rides as
    /// `systemInstruction`.
    fn build_request(&self, request: &TurnRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|entry| Content {
                role: Some(entry.role().to_string()),
                parts: vec![Part::text(entry.text())],
            })
            .collect();
        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(request.prompt.clone())],
        });

        let system_instruction = if request.system_prompt.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part::text(request.system_prompt.clone())],
            })
        };

        GenerateContentRequest {
            contents,
            system_instruction,
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        // The key rides as a query parameter; never log this URL.
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_url, self.config.model, request.api_key
        );
        let body = self.build_request(&request);

        debug!(model = %self.config.model, turns = body.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(ClientError::api(
                    "gemini",
                    format!("({}) {}", status.as_u16(), api_error.error.message),
                ));
            }
            return Err(ClientError::api(
                "gemini",
                format!("({}) {}", status.as_u16(), error_text),
            ));
        }

        let completion: GenerateContentResponse = response.json().await.map_err(|e| {
            ClientError::api("gemini", format!("Failed to parse response: {}", e))
        })?;

        completion
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|part| part.text.clone()))
            .ok_or_else(|| ClientError::EmptyResponse("gemini".to_string()))
    }

    fn vendor(&self) -> &str {
        "gemini"
    }
}
