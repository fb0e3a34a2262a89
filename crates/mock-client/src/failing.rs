//! Failing client implementation - always returns a vendor API error.

use async_trait::async_trait;

use chat_core::{ClientError, LlmClient, TurnRequest};

/// A client whose every call fails.
///
/// Useful for testing how the engine classifies and reports adapter
/// failures.
#[derive(Debug, Clone)]
pub struct FailingClient {
    vendor: String,
    message: String,
}

impl FailingClient {
    /// Create a FailingClient for the given vendor name.
    pub fn new(vendor: impl Into<String>) -> Self {
        Self::with_message(vendor, "simulated vendor failure")
    }

    /// Create a FailingClient that fails with a custom message.
    pub fn with_message(vendor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmClient for FailingClient {
    async fn generate(&self, _request: TurnRequest) -> Result<String, ClientError> {
        Err(ClientError::api(self.vendor.clone(), self.message.clone()))
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }
}
