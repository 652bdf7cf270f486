//! Post feed entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as read back from the remote collection.
///
/// `id` is the store-generated document key. `timestamp` is whatever
/// instant the store holds for the post; a freshly submitted post only
/// carries the client wall clock until the next snapshot delivers the
/// authoritative value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(alias = "_firestore_id", default)]
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A post as submitted by the client, before the store assigns a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub text: String,
    /// Client wall-clock creation time, placeholder until the
    /// server-assigned instant arrives.
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}
