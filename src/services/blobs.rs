// SPDX-License-Identifier: MIT

//! Blob store: path-addressed binary upload returning a durable public
//! URL.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Remote binary storage seam.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` under `path` and return a public download URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Firebase Storage REST client.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    bucket: String,
    base_url: String,
}

impl FirebaseStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_base_url(bucket, "https://firebasestorage.googleapis.com")
    }

    /// Custom endpoint (storage emulator).
    pub fn with_base_url(bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket: bucket.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Blob(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Blob(format!("{}: {}", status, body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Decode(format!("upload response: {}", e)))?;

        let token = uploaded
            .download_tokens
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Blob("Upload response missing download token".to_string()))?;

        let public_url = format!(
            "{}/v0/b/{}/o/{}?alt=media&token={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(&uploaded.name),
            token
        );

        tracing::info!(path = %path, "Blob uploaded");
        Ok(public_url)
    }
}

/// In-memory blob store for tests. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBlobs {
    blobs: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes for `path` (test support).
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.get(path).map(|b| b.value().clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        self.blobs.insert(path.to_string(), bytes);
        Ok(format!("memory://{}", path))
    }
}
