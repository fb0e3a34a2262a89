//! Error types for orchestrator operations.

use chat_core::ClientError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while driving a conversation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The conversation does not exist or belongs to another user.
    #[error("conversation {conversation_id} not found")]
    NotFound { conversation_id: String },

    /// The conversation has an empty roster; no turn is possible.
    #[error("conversation {conversation_id} has no participants")]
    NoParticipants { conversation_id: String },

    /// The requesting user holds no API key for the vendor due to speak.
    #[error("user {user_id} has no API key for vendor {vendor}")]
    MissingCredential { user_id: String, vendor: String },

    /// A vendor name is not registered with any client.
    #[error("unknown vendor: {vendor}")]
    UnknownVendor { vendor: String },

    /// A roster failed validation before the conversation was created.
    #[error("invalid roster: {detail}")]
    InvalidRoster { detail: String },

    /// An advance is already in flight for the conversation.
    #[error("a turn is already in progress for conversation {conversation_id}")]
    TurnInProgress { conversation_id: String },

    /// The vendor adapter failed or timed out; nothing was persisted.
    #[error("adapter {vendor} failed: {message}")]
    AdapterFailure { vendor: String, message: String },

    /// The storage layer failed.
    #[error("persistence failed: {0}")]
    PersistenceFailure(#[from] DatabaseError),

    /// The stored log violates an invariant the engine relies on.
    #[error("invalid conversation state: {detail}")]
    InvalidState { detail: String },
}

impl OrchestratorError {
    /// Wrap an adapter error, tagging it with the vendor that produced it.
    pub(crate) fn adapter(vendor: impl Into<String>, error: ClientError) -> Self {
        OrchestratorError::AdapterFailure {
            vendor: vendor.into(),
            message: error.to_string(),
        }
    }

    /// Map a storage error: a missing conversation row becomes
    /// [`OrchestratorError::NotFound`], a corrupt row becomes
    /// [`OrchestratorError::InvalidState`], anything else is a
    /// persistence fault.
    pub(crate) fn storage(conversation_id: &str, error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound {
                entity: "conversation",
                ..
            } => OrchestratorError::NotFound {
                conversation_id: conversation_id.to_string(),
            },
            corrupt @ DatabaseError::Corrupt { .. } => OrchestratorError::InvalidState {
                detail: corrupt.to_string(),
            },
            other => OrchestratorError::PersistenceFailure(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
