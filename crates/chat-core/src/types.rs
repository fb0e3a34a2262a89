//! Conversation and turn records.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current UTC time as an RFC 3339 string with microsecond precision.
///
/// Every timestamp in the system comes from this function. Microsecond
/// precision keeps lexicographic order on the stored TEXT values equal to
/// chronological order, which the message log relies on.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    /// A participating LLM backend.
    Model,
    /// The human moderator who owns the conversation.
    Moderator,
}

impl SenderKind {
    /// Stable string form used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::Model => "model",
            SenderKind::Moderator => "moderator",
        }
    }

    /// Parse the stored string form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "model" => Some(SenderKind::Model),
            "moderator" => Some(SenderKind::Moderator),
            _ => None,
        }
    }
}

impl std::fmt::Display for SenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted turn in a conversation's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_kind: SenderKind,
    /// Vendor name for model turns, the moderator's user id otherwise.
    pub sender_id: String,
    /// Vendor name of the authoring model. Moderator turns may set this to
    /// name the participant the rotation should treat as the last speaker.
    pub model_name: Option<String>,
    pub content: String,
    /// RFC 3339 creation timestamp, microsecond precision.
    pub created_at: String,
}

impl StoredMessage {
    /// A turn authored by the model backend `model_name`.
    pub fn model_turn(
        conversation_id: impl Into<String>,
        model_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let model_name = model_name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            sender_kind: SenderKind::Model,
            sender_id: model_name.clone(),
            model_name: Some(model_name),
            content: content.into(),
            created_at: now_rfc3339(),
        }
    }

    /// A turn authored by the moderator.
    ///
    /// `anchor_model` optionally names the participant whose slot the
    /// rotation resumes from; `None` leaves the rotation to fall back to
    /// the final participant's slot.
    pub fn moderator_turn(
        conversation_id: impl Into<String>,
        moderator_id: impl Into<String>,
        content: impl Into<String>,
        anchor_model: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            sender_kind: SenderKind::Moderator,
            sender_id: moderator_id.into(),
            model_name: anchor_model,
            content: content.into(),
            created_at: now_rfc3339(),
        }
    }
}

/// A moderated multi-model conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// The owning moderator's user id.
    pub user_id: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Participating vendor names, in rotation order. Order is fixed at
    /// creation and never changes.
    pub participants: Vec<String>,
    /// System prompt shared by every participant.
    pub system_prompt: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    /// Create a conversation owned by `user_id`.
    pub fn new(
        user_id: impl Into<String>,
        name: Option<String>,
        participants: Vec<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name,
            participants,
            system_prompt: system_prompt.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
