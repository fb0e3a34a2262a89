//! Per-conversation advance gate.
//!
//! At most one advance may be in flight per conversation. The gate hands
//! out RAII permits; holding the permit covers the whole read, invoke,
//! append sequence, and dropping it reopens the conversation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tracks which conversations have an advance in flight.
///
/// Clones share the same state. The inner mutex is only held for the
/// membership check itself, never across an await point.
#[derive(Debug, Clone, Default)]
pub struct AdvanceGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl AdvanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the conversation. Returns `None` when an advance is already
    /// in flight for it.
    pub fn try_acquire(&self, conversation_id: &str) -> Option<AdvancePermit> {
        let mut in_flight = lock(&self.in_flight);
        if !in_flight.insert(conversation_id.to_string()) {
            return None;
        }
        Some(AdvancePermit {
            in_flight: Arc::clone(&self.in_flight),
            conversation_id: conversation_id.to_string(),
        })
    }

    /// Whether an advance currently holds the conversation.
    pub fn is_busy(&self, conversation_id: &str) -> bool {
        lock(&self.in_flight).contains(conversation_id)
    }
}

/// Proof of exclusive access to one conversation's advance path.
///
/// Dropping the permit releases the conversation, on success and on
/// every early return alike.
#[derive(Debug)]
pub struct AdvancePermit {
    in_flight: Arc<Mutex<HashSet<String>>>,
    conversation_id: String,
}

impl Drop for AdvancePermit {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.conversation_id);
    }
}
