//! The adapter seam between the engine and vendor LLM APIs.

use async_trait::async_trait;
use thiserror::Error;

use crate::history::ProjectedMessage;

/// Everything an adapter needs to produce one turn.
///
/// The engine owns history and credentials; adapters receive both per call
/// and hold no conversation state of their own.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// The requesting user's API key for this vendor.
    pub api_key: String,
    /// The text the model must respond to (the latest turn's content).
    pub prompt: String,
    /// Conversation-wide system prompt. May be empty.
    pub system_prompt: String,
    /// Prior turns, already projected into this vendor's role vocabulary.
    pub history: Vec<ProjectedMessage>,
}

impl TurnRequest {
    /// A request with no prior history.
    pub fn new(
        api_key: impl Into<String>,
        prompt: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            history: Vec::new(),
        }
    }

    /// Attach projected history.
    pub fn with_history(mut self, history: Vec<ProjectedMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Errors surfaced by vendor adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The adapter was misconfigured (bad base URL, missing model name).
    #[error("client configuration error: {0}")]
    Configuration(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The vendor answered with an error status or error body.
    #[error("{vendor} API error: {message}")]
    Api { vendor: String, message: String },

    /// The vendor answered successfully but returned no usable text.
    #[error("{0} returned no text content")]
    EmptyResponse(String),
}

impl ClientError {
    /// An [`ClientError::Api`] with owned vendor and message strings.
    pub fn api(vendor: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Api {
            vendor: vendor.into(),
            message: message.into(),
        }
    }
}

/// A vendor chat backend capable of generating one turn at a time.
///
/// Implementations are stateless request/response wrappers around one
/// vendor API. The trait is object-safe; the engine holds adapters as
/// `Arc<dyn LlmClient>`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate the text of one turn.
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError>;

    /// The symbolic vendor name this client serves, e.g. `"claude"`.
    fn vendor(&self) -> &str;
}
