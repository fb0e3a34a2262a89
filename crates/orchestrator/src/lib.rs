//! Turn-taking orchestration for multi-party model conversations.
//!
//! This crate provides the [`Orchestrator`] type which drives shared
//! conversations between several LLM backends, moderated by the human
//! auditor who owns them.
//!
//! # Features
//!
//! - Rotates turns cyclically through each conversation's roster
//! - Lets the moderator steer the rotation by anchoring any participant
//! - Projects the shared log into each speaker's point of view
//! - Admits at most one in-flight advance per conversation
//! - Persists every turn to an append-only log
//! - Broadcasts every state change to subscribers
//!
//! # Architecture
//!
//! ```text
//! advance_turn(conversation_id, user_id)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Load the conversation and its ordered log               │
//! │         ↓                                                   │
//! │  2. Resolve the next speaker (cyclic rotation, moderator    │
//! │     anchors respected) and the owner's API key              │
//! │         ↓                                                   │
//! │  3. Project the log into the speaker's view and invoke      │
//! │     its adapter under the turn timeout                      │
//! │         ↓                                                   │
//! │  4. Append the reply to the log                             │
//! │         ↓                                                   │
//! │  5. Broadcast turn_advanced (or advance_failed)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{CreateConversationRequest, Database, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:colloquy.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let engine = Orchestrator::new(db, providers::default_registry()?);
//!     database::credential::upsert_api_key(engine.db().pool(), "auditor-1", "claude", "sk-ant-...").await?;
//!     database::credential::upsert_api_key(engine.db().pool(), "auditor-1", "chatgpt", "sk-...").await?;
//!
//!     let conversation = engine
//!         .create_conversation(CreateConversationRequest {
//!             user_id: "auditor-1".to_string(),
//!             name: Some("round table".to_string()),
//!             participants: vec!["claude".to_string(), "chatgpt".to_string()],
//!             system_prompt: "You are on a panel. Keep replies short.".to_string(),
//!             seed_opening_turn: true,
//!         })
//!         .await?;
//!
//!     let turn = engine.advance_turn(&conversation.id, "auditor-1").await?;
//!     println!("{}: {}", turn.sender_id, turn.content);
//!     Ok(())
//! }
//! ```

mod error;
mod events;
mod gate;
mod orchestrator;
mod projection;
mod rotation;

// Public exports
pub use error::{OrchestratorError, Result};
pub use events::{ConversationEvent, EventBus};
pub use orchestrator::{ConversationDetail, CreateConversationRequest, Orchestrator};
pub use projection::{project_history, vocabulary_for, Vocabulary};
pub use rotation::{decide_next_turn, RotationError, TurnDecision, BOOTSTRAP_PROMPT};

// Re-export commonly used types from dependencies
pub use chat_core::{
    ClientError, ClientRegistry, Conversation, LlmClient, SenderKind, StoredMessage, TurnRequest,
};
pub use database::Database;
