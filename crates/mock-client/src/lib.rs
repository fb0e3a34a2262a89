//! Mock LlmClient implementations for testing Colloquy.
//!
//! This crate provides test doubles for the `LlmClient` trait:
//! - `EchoClient` - Replies with the prompt it was given
//! - `ScriptedClient` - Plays back a fixed list of replies and records
//!   every request it receives
//! - `FailingClient` - Always fails with a vendor API error
//! - `DelayedClient` - Wraps another client with artificial latency
//!
//! For real vendor backends, use the `providers` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_client::{EchoClient, LlmClient, TurnRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_client::ClientError> {
//!     let client = EchoClient::new("claude");
//!     let reply = client
//!         .generate(TurnRequest::new("test-key", "Hello!", ""))
//!         .await?;
//!     assert_eq!(reply, "Hello!");
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;
mod scripted;

// Re-export chat-core types for convenience
pub use chat_core::{async_trait, ClientError, LlmClient, ProjectedMessage, TurnRequest};

pub use delayed::DelayedClient;
pub use echo::EchoClient;
pub use failing::FailingClient;
pub use scripted::ScriptedClient;
