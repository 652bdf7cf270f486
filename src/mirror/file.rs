//! File-backed mirror: one JSON document holding all keys.
//!
//! Write volume is tiny (a handful of keys, mutated on explicit user
//! actions), so every mutation rewrites the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::LocalMirror;
use crate::error::{AppError, Result};

/// Durable mirror persisted to a single JSON file.
#[derive(Clone)]
pub struct FileMirror {
    path: Arc<PathBuf>,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FileMirror {
    /// Open (or create) the mirror file.
    ///
    /// An unreadable or corrupt file degrades to an empty mirror rather
    /// than failing the caller; the damage is logged and the next write
    /// replaces the file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::Mirror(format!("create {}: {}", parent.display(), e)))?;
            }
        }

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt mirror file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable mirror file, starting empty");
                BTreeMap::new()
            }
        };

        Ok(Self {
            path: Arc::new(path),
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::Mirror(format!("encode mirror: {}", e)))?;
        tokio::fs::write(self.path.as_ref(), raw)
            .await
            .map_err(|e| AppError::Mirror(format!("write {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl LocalMirror for FileMirror {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await
    }
}
