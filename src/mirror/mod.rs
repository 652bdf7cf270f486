// SPDX-License-Identifier: MIT

//! Local mirror: durable on-device key-value cache.
//!
//! The mirror is a point-in-time copy of remote state plus a handful of
//! one-shot control flags passed between screens. It is never merged
//! client-side with remote data; a fresh remote read always overwrites
//! the cached profile wholesale.

pub mod file;
pub mod flags;
pub mod memory;

pub use file::FileMirror;
pub use flags::{Banner, BannerKind, SessionFlags};
pub use memory::MemoryMirror;

use async_trait::async_trait;

use crate::error::Result;

/// Mirror keys as constants.
pub mod keys {
    /// Cached profile snapshot (JSON-encoded `UserProfile`)
    pub const USER_DATA: &str = "@user_data";
    /// One-shot: next screen must bypass the mirror and reload
    pub const FORCE_RELOAD: &str = "@force_reload";
    /// One-shot banner text
    pub const BANNER_MESSAGE: &str = "@banner_message";
    /// One-shot banner kind ("success" | "error")
    pub const BANNER_TYPE: &str = "@banner_type";
}

/// Durable string-keyed cache, values are JSON text.
///
/// A single shared namespace with one writer assumed at a time; there
/// is no concurrent-write arbitration.
#[async_trait]
pub trait LocalMirror: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    /// Remove every key, not just the profile snapshot.
    async fn clear(&self) -> Result<()>;
}
