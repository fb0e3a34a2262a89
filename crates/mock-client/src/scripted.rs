//! Scripted client implementation - plays back fixed replies and records
//! every request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use chat_core::{ClientError, LlmClient, TurnRequest};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A client that answers from a fixed script, in order, and records every
/// request for later inspection.
///
/// Clones share state: tests keep one handle for assertions while the
/// engine owns another.
#[derive(Debug, Clone)]
pub struct ScriptedClient {
    vendor: String,
    replies: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
}

impl ScriptedClient {
    /// Create a ScriptedClient for `vendor` that will play back `replies`.
    pub fn new<I, S>(vendor: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vendor: vendor.into(),
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<TurnRequest> {
        lock(&self.requests).clone()
    }

    /// Number of scripted replies not yet played back.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn generate(&self, request: TurnRequest) -> Result<String, ClientError> {
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .ok_or_else(|| ClientError::api(self.vendor.clone(), "script exhausted"))
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }
}
