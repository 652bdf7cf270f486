// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides the production implementations of [`ProfileStore`] and
//! [`PostStore`]:
//! - `users/{uid}` profile documents (get / field-masked merge / delete)
//! - `posts` collection (list, insert with generated id)
//!
//! Firestore itself has no cheap client-side change push here, so the
//! feed change signal is driven by [`FirestoreDb::start_feed_ticker`];
//! the feed layer re-lists on each tick and suppresses unchanged
//! snapshots.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{collections, PostStore, ProfileStore};
use crate::error::{AppError, Result};
use crate::models::{Post, PostDraft, ProfileUpdate, UserProfile};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    feed_rev: Arc<watch::Sender<u64>>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(Some(client)))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::with_client(Some(client)))
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self::with_client(None)
    }

    fn with_client(client: Option<firestore::FirestoreDb>) -> Self {
        let (feed_rev, _) = watch::channel(0);
        Self {
            client,
            feed_rev: Arc::new(feed_rev),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Drive the feed change signal by bumping the revision every
    /// `interval`. The returned handle owns the poller; abort it when
    /// the feed is no longer displayed.
    pub fn start_feed_ticker(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let feed_rev = Arc::clone(&self.feed_rev);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                feed_rev.send_modify(|rev| *rev += 1);
            }
        })
    }
}

#[async_trait]
impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn merge_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(update.field_paths())
            .in_col(collections::USERS)
            .document_id(uid)
            .object(update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(uid = %uid, fields = ?update.field_paths(), "Merged profile fields");
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(uid = %uid, "Deleted profile document");
        Ok(())
    }
}

#[async_trait]
impl PostStore for FirestoreDb {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_post(&self, draft: &PostDraft) -> Result<Post> {
        let created: Post = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::POSTS)
            .generate_document_id()
            .object(draft)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.feed_rev.send_modify(|rev| *rev += 1);
        Ok(created)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.feed_rev.subscribe()
    }
}
