//! Echo client implementation - replies with the prompt it was given.

use async_trait::async_trait;

use chat_core::{ClientError, LlmClient, TurnRequest};

/// A client that echoes the prompt back as its reply.
///
/// Useful for testing the advance flow without any model behind it.
#[derive(Debug, Clone)]
pub struct EchoClient {
    vendor: String,
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoClient {
    /// Create an EchoClient answering for the given vendor name.
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            prefix: None,
        }
    }

    /// Create an EchoClient that prepends a prefix to every reply.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_client::EchoClient;
    ///
    /// let client = EchoClient::with_prefix("claude", "Echo: ");
    /// // Will reply with "Echo: <prompt>"
    /// ```
    pub fn with_prefix(vendor: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl LlmClient for EchoClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        let reply = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.prompt),
            None => request.prompt,
        };
        Ok(reply)
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }
}
