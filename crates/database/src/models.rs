//! Row types mapped from SQLite.

use chat_core::{Conversation, SenderKind, StoredMessage};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// A `conversations` row. The participant roster is a JSON array of
/// vendor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConversationRow {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub participants: String,
    pub system_prompt: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ConversationRow {
    /// Decode into the shared conversation type.
    pub fn into_conversation(self) -> Result<Conversation, DatabaseError> {
        let participants: Vec<String> = serde_json::from_str(&self.participants)?;
        Ok(Conversation {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            participants,
            system_prompt: self.system_prompt,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A `messages` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_kind: String,
    pub sender_id: String,
    pub model_name: Option<String>,
    pub content: String,
    pub created_at: String,
}

impl MessageRow {
    /// Decode into the shared message type.
    pub fn into_message(self) -> Result<StoredMessage, DatabaseError> {
        let sender_kind =
            SenderKind::parse(&self.sender_kind).ok_or_else(|| DatabaseError::Corrupt {
                entity: "message",
                id: self.id.clone(),
                detail: format!("unknown sender kind {:?}", self.sender_kind),
            })?;
        Ok(StoredMessage {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_kind,
            sender_id: self.sender_id,
            model_name: self.model_name,
            content: self.content,
            created_at: self.created_at,
        })
    }
}
