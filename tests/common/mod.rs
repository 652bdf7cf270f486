//! Shared fixtures for the sync policy tests.

use std::time::Duration;

use growlog_client::mirror::MemoryMirror;
use growlog_client::models::{Session, UserProfile};
use growlog_client::services::{MemoryBlobs, MemoryIdentity, ProfileSync};
use growlog_client::store::MemoryStore;

pub type MemorySync = ProfileSync<MemoryStore, MemoryIdentity, MemoryBlobs, MemoryMirror>;

pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// A sync policy over shared-handle memory collaborators; the returned
/// clones observe everything the policy does.
pub fn memory_sync() -> (MemorySync, MemoryStore, MemoryIdentity, MemoryBlobs, MemoryMirror) {
    let store = MemoryStore::new();
    let identity = MemoryIdentity::new();
    let blobs = MemoryBlobs::new();
    let mirror = MemoryMirror::new();

    let sync = ProfileSync::new(
        store.clone(),
        identity.clone(),
        blobs.clone(),
        mirror.clone(),
        LOAD_TIMEOUT,
    );
    (sync, store, identity, blobs, mirror)
}

pub fn verified_session(uid: &str) -> Session {
    Session::verified(uid, format!("{}@example.com", uid))
}

pub fn profile(display_name: &str, bio: &str) -> UserProfile {
    UserProfile {
        display_name: Some(display_name.to_string()),
        bio: Some(bio.to_string()),
        ..Default::default()
    }
}
