// SPDX-License-Identifier: MIT

//! Remote document store (Firestore).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Post, PostDraft, ProfileUpdate, UserProfile};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
}

/// Authoritative per-user profile documents, keyed by the session uid.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Field-masked merge: only the fields named by `update` are
    /// touched, unlisted fields are never dropped. Concurrent writers on
    /// the same field are last-write-wins with no conflict detection.
    async fn merge_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<()>;

    /// Idempotent: deleting an absent document succeeds.
    async fn delete_profile(&self, uid: &str) -> Result<()>;
}

/// The shared post collection backing the live feed.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Full current post list, in store insertion order. No
    /// chronological guarantee.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    /// Add a post under a store-generated key; returns the stored post.
    async fn add_post(&self, draft: &PostDraft) -> Result<Post>;

    /// Change signal for the feed. The value is an opaque revision
    /// counter; a bump means "the collection may have changed, re-list".
    fn changes(&self) -> watch::Receiver<u64>;
}
