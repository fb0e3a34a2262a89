//! Conversation event fan-out.
//!
//! Observers subscribe to a broadcast channel and receive one event per
//! state change. Delivery is best-effort: publishing with no subscribers
//! is not an error, and a lagging subscriber loses the oldest events,
//! never the engine's progress.

use chat_core::StoredMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events slow subscribers can fall behind before losing the oldest.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A state change some conversation went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A model took its turn and the reply was persisted.
    TurnAdvanced {
        conversation_id: String,
        message: StoredMessage,
    },
    /// The moderator posted into the log.
    ModeratorPosted {
        conversation_id: String,
        message: StoredMessage,
    },
    /// The shared system prompt changed.
    SystemPromptUpdated {
        conversation_id: String,
        prompt: String,
    },
    /// An advance was attempted and failed after the conversation resolved.
    AdvanceFailed {
        conversation_id: String,
        reason: String,
    },
}

impl ConversationEvent {
    /// The conversation the event belongs to.
    pub fn conversation_id(&self) -> &str {
        match self {
            ConversationEvent::TurnAdvanced {
                conversation_id, ..
            }
            | ConversationEvent::ModeratorPosted {
                conversation_id, ..
            }
            | ConversationEvent::SystemPromptUpdated {
                conversation_id, ..
            }
            | ConversationEvent::AdvanceFailed {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

/// Broadcast channel carrying [`ConversationEvent`]s to observers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConversationEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Open a fresh subscription. Only events published after this call
    /// are delivered to it.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    /// Zero subscribers is fine; the event is simply dropped.
    pub fn publish(&self, event: ConversationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
