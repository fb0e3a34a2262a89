//! History projection: the shared log as one participant sees it.

use chat_core::{ProjectedMessage, SenderKind, StoredMessage};

/// How a vendor spells conversation roles on the wire.
///
/// Most vendors follow the Chat Completions convention; the table in
/// [`vocabulary_for`] holds the exceptions. Adding a vendor with its own
/// vocabulary is a one-entry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    /// Role name for the target speaker's own past turns.
    pub assistant: &'static str,
    /// Role name for every other message.
    pub user: &'static str,
    /// Whether content is wrapped in a parts array instead of a flat string.
    pub wraps_parts: bool,
}

const CHAT_COMPLETIONS: Vocabulary = Vocabulary {
    assistant: "assistant",
    user: "user",
    wraps_parts: false,
};

const GEMINI: Vocabulary = Vocabulary {
    assistant: "model",
    user: "user",
    wraps_parts: true,
};

/// Vendors whose vocabulary differs from the Chat Completions default.
const VENDOR_VOCABULARIES: &[(&str, Vocabulary)] = &[("gemini", GEMINI)];

/// Look up the role vocabulary for a vendor.
pub fn vocabulary_for(vendor: &str) -> Vocabulary {
    VENDOR_VOCABULARIES
        .iter()
        .find(|(name, _)| *name == vendor)
        .map(|(_, vocabulary)| *vocabulary)
        .unwrap_or(CHAT_COMPLETIONS)
}

/// Project the shared log into the target speaker's point of view.
///
/// The target's own model turns become `assistant` (or the vendor's
/// spelling of it); every other message, moderator turns included,
/// becomes `user`. Order is preserved and nothing is dropped.
pub fn project_history(log: &[StoredMessage], target_speaker: &str) -> Vec<ProjectedMessage> {
    let vocabulary = vocabulary_for(target_speaker);
    log.iter()
        .map(|message| {
            let own_turn = message.sender_kind == SenderKind::Model
                && message.model_name.as_deref() == Some(target_speaker);
            let role = if own_turn {
                vocabulary.assistant
            } else {
                vocabulary.user
            };
            if vocabulary.wraps_parts {
                ProjectedMessage::parts(role, &message.content)
            } else {
                ProjectedMessage::flat(role, &message.content)
            }
        })
        .collect()
}
