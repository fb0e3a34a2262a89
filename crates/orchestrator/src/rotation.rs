//! Participant rotation: deciding who speaks next.

use chat_core::{SenderKind, StoredMessage};
use thiserror::Error;

/// The prompt handed to the first speaker of an empty conversation.
pub const BOOTSTRAP_PROMPT: &str =
    "Hello! Please introduce yourself based on the system prompt and start the conversation.";

/// What the next turn looks like: who speaks, to what prompt, with what
/// history behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDecision {
    /// Vendor name of the participant who speaks next.
    pub speaker: String,
    /// The text the speaker responds to.
    pub prompt: String,
    /// Every message before the prompt, in log order.
    pub history: Vec<StoredMessage>,
}

/// Rotation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// The roster is empty; no turn is possible.
    #[error("no participants to rotate through")]
    NoParticipants,

    /// A model turn carries no model name, so the anchor is unknowable.
    #[error("model turn {message_id} has no model name")]
    UnattributedModelTurn { message_id: String },
}

/// Decide the next turn from the roster and the ordered message log.
///
/// Pure: identical inputs always produce identical outputs. The log must
/// already be in timestamp order.
///
/// Rules:
/// - Empty log: the first participant speaks, prompted by
///   [`BOOTSTRAP_PROMPT`], with no history.
/// - Last turn by a model: that model is the anchor; the participant
///   after it in the roster speaks. An anchor that has left the roster
///   hands the turn to the first participant.
/// - Last turn by the moderator: its `model_name` is the anchor when it
///   names a roster member; otherwise the cycle resumes from the end of
///   the roster, so the first participant speaks.
/// - The last message's content becomes the prompt; everything before it
///   becomes the history.
pub fn decide_next_turn(
    participants: &[String],
    log: &[StoredMessage],
) -> Result<TurnDecision, RotationError> {
    if participants.is_empty() {
        return Err(RotationError::NoParticipants);
    }

    let Some((last, earlier)) = log.split_last() else {
        return Ok(TurnDecision {
            speaker: participants[0].clone(),
            prompt: BOOTSTRAP_PROMPT.to_string(),
            history: Vec::new(),
        });
    };

    let anchor: &str = match last.sender_kind {
        SenderKind::Model => {
            last.model_name
                .as_deref()
                .ok_or_else(|| RotationError::UnattributedModelTurn {
                    message_id: last.id.clone(),
                })?
        }
        SenderKind::Moderator => last
            .model_name
            .as_deref()
            .filter(|name| participants.iter().any(|p| p == name))
            .unwrap_or_else(|| participants[participants.len() - 1].as_str()),
    };

    let speaker = participants
        .iter()
        .position(|p| p == anchor)
        .map(|index| participants[(index + 1) % participants.len()].clone())
        .unwrap_or_else(|| participants[0].clone());

    Ok(TurnDecision {
        speaker,
        prompt: last.content.clone(),
        history: earlier.to_vec(),
    })
}
