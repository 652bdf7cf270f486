//! In-memory mirror for tests and ephemeral sessions.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::LocalMirror;
use crate::error::Result;

/// Non-durable mirror backed by a concurrent map. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryMirror {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (test support).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LocalMirror for MemoryMirror {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
