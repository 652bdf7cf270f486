//! In-memory document store for tests and offline development.
//!
//! Clones share state, mirroring the cheap-handle semantics of the
//! Firestore client. Failure and stall injection knobs let tests drive
//! the sync policy through its error and timeout paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;

use super::{PostStore, ProfileStore};
use crate::error::{AppError, Result};
use crate::models::{Post, PostDraft, ProfileUpdate, UserProfile};

/// In-memory stand-in for the remote document store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    profiles: DashMap<String, UserProfile>,
    posts: Mutex<Vec<Post>>,
    next_post_id: AtomicU64,
    feed_rev: watch::Sender<u64>,
    fail_merges: AtomicBool,
    fail_deletes: AtomicBool,
    stall_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (feed_rev, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                profiles: DashMap::new(),
                posts: Mutex::new(Vec::new()),
                next_post_id: AtomicU64::new(1),
                feed_rev,
                fail_merges: AtomicBool::new(false),
                fail_deletes: AtomicBool::new(false),
                stall_reads: AtomicBool::new(false),
            }),
        }
    }

    // ─── Test Support ────────────────────────────────────────────

    /// Seed a profile document directly, bypassing merge semantics.
    pub fn seed_profile(&self, uid: &str, profile: UserProfile) {
        self.inner.profiles.insert(uid.to_string(), profile);
    }

    /// Push a raw post, including its id. Lets tests stage duplicate
    /// ids across snapshots.
    pub fn seed_post(&self, post: Post) {
        self.inner.posts.lock().unwrap().push(post);
        self.notify_feed();
    }

    /// Bump the feed revision without changing the collection.
    pub fn notify_feed(&self) {
        self.inner.feed_rev.send_modify(|rev| *rev += 1);
    }

    /// Make subsequent merge writes fail.
    pub fn fail_merges(&self, fail: bool) {
        self.inner.fail_merges.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent profile deletes fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.inner.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make profile reads hang forever (timeout-path testing).
    pub fn stall_reads(&self, stall: bool) {
        self.inner.stall_reads.store(stall, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        if self.inner.stall_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self.inner.profiles.get(uid).map(|p| p.value().clone()))
    }

    async fn merge_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<()> {
        if self.inner.fail_merges.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected merge failure".to_string()));
        }
        let mut entry = self.inner.profiles.entry(uid.to_string()).or_default();
        update.apply_to(entry.value_mut());
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> Result<()> {
        if self.inner.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected delete failure".to_string()));
        }
        self.inner.profiles.remove(uid);
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.inner.posts.lock().unwrap().clone())
    }

    async fn add_post(&self, draft: &PostDraft) -> Result<Post> {
        let id = self.inner.next_post_id.fetch_add(1, Ordering::SeqCst);
        let post = Post {
            id: format!("post-{}", id),
            text: draft.text.clone(),
            // The store is the authority for the final instant.
            timestamp: Some(Utc::now()),
        };
        self.inner.posts.lock().unwrap().push(post.clone());
        self.notify_feed();
        Ok(post)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.inner.feed_rev.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_creates_then_patches() {
        let store = MemoryStore::new();

        let update = ProfileUpdate {
            display_name: Some("Alex".to_string()),
            ..Default::default()
        };
        store.merge_profile("u1", &update).await.unwrap();

        let update = ProfileUpdate {
            bio: Some("hi".to_string()),
            ..Default::default()
        };
        store.merge_profile("u1", &update).await.unwrap();

        let profile = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Alex"));
        assert_eq!(profile.bio.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.delete_profile("missing").await.unwrap();
    }

    #[tokio::test]
    async fn add_post_assigns_key_and_instant() {
        let store = MemoryStore::new();
        let post = store.add_post(&PostDraft::new("hello")).await.unwrap();
        assert!(!post.id.is_empty());
        assert!(post.timestamp.is_some());
    }
}
