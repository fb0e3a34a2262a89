//! Vendor LLM backends for Colloquy.
//!
//! Each module wraps one vendor's chat API behind the `LlmClient` trait:
//! - `anthropic` - Claude via the Messages API (vendor name `claude`)
//! - `openai` - ChatGPT via Chat Completions (vendor name `chatgpt`)
//! - `deepseek` - DeepSeek's OpenAI-compatible Chat Completions
//! - `gemini` - Gemini via `generateContent`
//!
//! Adapters hold no secrets: the caller passes the requesting user's API
//! key with every `TurnRequest`. Base URLs and model names come from the
//! environment with sensible defaults, so a proxy or a model pin is a
//! variable away.
//!
//! # Example
//!
//! ```no_run
//! use chat_core::{LlmClient, TurnRequest};
//! use providers::AnthropicClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_core::ClientError> {
//!     let client = AnthropicClient::from_env()?;
//!     let reply = client
//!         .generate(TurnRequest::new("sk-ant-...", "Say hi.", ""))
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

pub mod anthropic;
pub mod deepseek;
pub mod gemini;
pub mod openai;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use deepseek::{DeepSeekClient, DeepSeekConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiClient, OpenAiConfig};

use std::sync::Arc;

use chat_core::{ClientError, ClientRegistry};

/// A registry holding all four stock vendors, configured from the
/// environment.
pub fn default_registry() -> Result<ClientRegistry, ClientError> {
    let mut registry = ClientRegistry::new();
    registry.register(Arc::new(AnthropicClient::from_env()?));
    registry.register(Arc::new(OpenAiClient::from_env()?));
    registry.register(Arc::new(DeepSeekClient::from_env()?));
    registry.register(Arc::new(GeminiClient::from_env()?));
    Ok(registry)
}
