//! Client-side key-value store for form drafts.
//!
//! Offer letters and contract drafts survive between sessions through
//! whatever storage the host provides; the core only needs get/set/remove
//! by key. The in-memory implementation backs tests and short-lived
//! sessions.

use serde_json::Value;
use std::collections::HashMap;

pub trait DraftStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: HashMap<String, Value>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
