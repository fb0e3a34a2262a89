//! Delayed client implementation - wraps another client with artificial
//! latency.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use chat_core::{ClientError, LlmClient, TurnRequest};

/// A client that waits before delegating to another client.
///
/// Useful for testing timeout handling and simulating vendor latency.
pub struct DelayedClient<C: LlmClient> {
    inner: C,
    delay: Duration,
}

impl<C: LlmClient> DelayedClient<C> {
    /// Wrap `inner` with the specified delay.
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Wrap `inner` with a delay in milliseconds.
    pub fn with_millis(inner: C, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for DelayedClient<C> {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        sleep(self.delay).await;
        self.inner.generate(request).await
    }

    fn vendor(&self) -> &str {
        self.inner.vendor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EchoClient;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delays_then_delegates() {
        let client = DelayedClient::with_millis(EchoClient::new("claude"), 100);

        let start = Instant::now();
        let reply = client
            .generate(TurnRequest::new("key", "test", ""))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(reply, "test");
        assert!(elapsed >= Duration::from_millis(100));
        assert_eq!(client.vendor(), "claude");
    }
}
