//! In-memory session store fake.
//!
//! Implements the full `SessionStore` contract over mutexed maps, including
//! the chat-history cascade: tests can seed chat payloads and assert they
//! disappear with the space while usage records survive.

use async_trait::async_trait;
use space_controller::errors::ScError;
use space_controller::models::{Space, UsageRecord};
use space_controller::store::SessionStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryStoreInner {
    spaces: HashMap<String, Space>,
    chat: HashMap<String, String>,
    usage: HashMap<String, UsageRecord>,
}

/// In-memory `SessionStore` for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning the trait-object form managers
    /// expect.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a space record directly, bypassing the managers.
    pub fn with_space(self, space: Space) -> Self {
        self.insert_space(space);
        self
    }

    /// Insert a space record directly.
    pub fn insert_space(&self, space: Space) {
        let mut inner = self.inner.lock().unwrap();
        inner.spaces.insert(space.name.clone(), space);
    }

    /// Seed chat history for a space (normally written by the chat
    /// transport outside the core).
    pub fn insert_chat(&self, space: &str, payload: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.chat.insert(space.to_string(), payload.to_string());
    }

    /// Read back a space record for assertions.
    pub fn space(&self, name: &str) -> Option<Space> {
        self.inner.lock().unwrap().spaces.get(name).cloned()
    }

    /// Read back chat history for assertions.
    pub fn chat(&self, name: &str) -> Option<String> {
        self.inner.lock().unwrap().chat.get(name).cloned()
    }

    /// Read back a usage record for assertions.
    pub fn usage(&self, name: &str) -> Option<UsageRecord> {
        self.inner.lock().unwrap().usage.get(name).cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get_space(&self, name: &str) -> Result<Option<Space>, ScError> {
        Ok(self.inner.lock().unwrap().spaces.get(name).cloned())
    }

    async fn put_space(&self, space: &Space) -> Result<(), ScError> {
        let mut inner = self.inner.lock().unwrap();
        inner.spaces.insert(space.name.clone(), space.clone());
        Ok(())
    }

    async fn remove_space(&self, name: &str) -> Result<(), ScError> {
        let mut inner = self.inner.lock().unwrap();
        inner.spaces.remove(name);
        // Cascade matches the Redis pipeline: chat goes, usage stays
        inner.chat.remove(name);
        Ok(())
    }

    async fn space_exists(&self, name: &str) -> Result<bool, ScError> {
        Ok(self.inner.lock().unwrap().spaces.contains_key(name))
    }

    async fn space_names(&self) -> Result<Vec<String>, ScError> {
        Ok(self.inner.lock().unwrap().spaces.keys().cloned().collect())
    }

    async fn get_usage(&self, name: &str) -> Result<Option<UsageRecord>, ScError> {
        Ok(self.inner.lock().unwrap().usage.get(name).cloned())
    }

    async fn put_usage(&self, name: &str, record: &UsageRecord) -> Result<(), ScError> {
        let mut inner = self.inner.lock().unwrap();
        inner.usage.insert(name.to_string(), record.clone());
        Ok(())
    }

    async fn usage_names(&self) -> Result<Vec<String>, ScError> {
        Ok(self.inner.lock().unwrap().usage.keys().cloned().collect())
    }
}
