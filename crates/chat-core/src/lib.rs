//! Core types shared by every Colloquy crate.
//!
//! This crate defines the vocabulary of a moderated multi-model
//! conversation (conversations, turns, sender kinds), the projected
//! history shapes vendor APIs consume, the [`LlmClient`] trait that every
//! backend adapter implements, and the [`ClientRegistry`] that maps vendor
//! names to live clients. It performs no I/O of its own.
//!
//! # Example
//!
//! ```no_run
//! use chat_core::{ClientError, LlmClient, TurnRequest};
//!
//! struct Parrot;
//!
//! #[chat_core::async_trait]
//! impl LlmClient for Parrot {
//!     async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
//!         Ok(request.prompt)
//!     }
//!
//!     fn vendor(&self) -> &str {
//!         "parrot"
//!     }
//! }
//! ```

mod client;
mod history;
mod registry;
mod types;

pub use client::{ClientError, LlmClient, TurnRequest};
pub use history::{ProjectedMessage, TextPart};
pub use registry::ClientRegistry;
pub use types::{now_rfc3339, Conversation, SenderKind, StoredMessage};

// Re-exported so implementors don't need a direct async-trait dependency.
pub use async_trait::async_trait;
