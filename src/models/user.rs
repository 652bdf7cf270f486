//! User profile schema and the partial-update type.
//!
//! The remote `users/{uid}` document is the single source of truth;
//! `UserProfile` is its typed shape and `ProfileUpdate` is the only way
//! to write it (field-masked merge, never a full replacement).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};

/// User profile document stored in Firestore (`users/{uid}`).
///
/// The document key is the authenticated user's identifier; the client
/// never generates one. Field names follow the wire format of the
/// original documents, so existing data decodes unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Public download URL of the profile picture
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Times volunteered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteered: Option<u32>,
    /// Events facilitated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitated: Option<u32>,
    /// Events attended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<u32>,
    /// Groups joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hobbies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl UserProfile {
    /// Validating decode at the store/mirror boundary.
    ///
    /// Fails with a named decoding error instead of silently propagating
    /// missing or mistyped fields.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Decode(format!("user profile: {}", e)))
    }

    /// Parse the text encoding used by the local mirror.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| AppError::Decode(format!("user profile: {}", e)))
    }

    /// Text encoding stored in the local mirror.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AppError::Mirror(format!("user profile: {}", e)))
    }
}

/// Partial profile update.
///
/// Only set fields are serialized and only set fields appear in the
/// merge mask, so a write can never drop a field it does not name.
/// Concurrent writers touching the same field are last-write-wins with
/// no conflict detection; this is inherited from the backing store and
/// is the documented policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(max = 80))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[validate(url)]
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volunteered: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitated: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[validate(length(max = 120))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl ProfileUpdate {
    /// Wire-format names of the set fields, used as the merge mask.
    pub fn field_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if self.display_name.is_some() {
            paths.push("displayName".to_string());
        }
        if self.bio.is_some() {
            paths.push("bio".to_string());
        }
        if self.photo_url.is_some() {
            paths.push("photoURL".to_string());
        }
        if self.volunteered.is_some() {
            paths.push("volunteered".to_string());
        }
        if self.facilitated.is_some() {
            paths.push("facilitated".to_string());
        }
        if self.events.is_some() {
            paths.push("events".to_string());
        }
        if self.group.is_some() {
            paths.push("group".to_string());
        }
        if self.hobbies.is_some() {
            paths.push("hobbies".to_string());
        }
        if self.birthday.is_some() {
            paths.push("birthday".to_string());
        }
        if self.city.is_some() {
            paths.push("city".to_string());
        }
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Shallow-merge the set fields onto `profile`, leaving the rest
    /// untouched. Same semantics as the remote merge write.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(v) = &self.display_name {
            profile.display_name = Some(v.clone());
        }
        if let Some(v) = &self.bio {
            profile.bio = Some(v.clone());
        }
        if let Some(v) = &self.photo_url {
            profile.photo_url = Some(v.clone());
        }
        if let Some(v) = self.volunteered {
            profile.volunteered = Some(v);
        }
        if let Some(v) = self.facilitated {
            profile.facilitated = Some(v);
        }
        if let Some(v) = self.events {
            profile.events = Some(v);
        }
        if let Some(v) = self.group {
            profile.group = Some(v);
        }
        if let Some(v) = &self.hobbies {
            profile.hobbies = v.clone();
        }
        if let Some(v) = &self.birthday {
            profile.birthday = Some(v.clone());
        }
        if let Some(v) = &self.city {
            profile.city = Some(v.clone());
        }
    }
}
