//! Vendor registry mapping symbolic names to live clients.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::LlmClient;

/// Maps symbolic vendor names (`"claude"`, `"gemini"`, ...) to the clients
/// that serve them.
///
/// The engine validates participant rosters against this map and resolves
/// the next speaker through it. Adding a vendor is a registration, not a
/// code change anywhere else.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn LlmClient>>,
}

impl ClientRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under its own vendor name, replacing any previous
    /// client for that vendor.
    pub fn register(&mut self, client: Arc<dyn LlmClient>) {
        self.clients.insert(client.vendor().to_string(), client);
    }

    /// Look up the client for a vendor.
    pub fn get(&self, vendor: &str) -> Option<Arc<dyn LlmClient>> {
        self.clients.get(vendor).cloned()
    }

    /// Whether a vendor is known.
    pub fn contains(&self, vendor: &str) -> bool {
        self.clients.contains_key(vendor)
    }

    /// Known vendor names, sorted.
    pub fn known_vendors(&self) -> Vec<String> {
        let mut vendors: Vec<String> = self.clients.keys().cloned().collect();
        vendors.sort();
        vendors
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("vendors", &self.known_vendors())
            .finish()
    }
}
