//! Authenticated session handle.

/// A verified-or-not identity handle, passed explicitly to the sync
/// policy instead of being read from ambient global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity provider user id; also the remote profile document key.
    pub uid: String,
    pub email: Option<String>,
    /// The sync policy treats an unverified session as logged out.
    pub email_verified: bool,
    pub photo_url: Option<String>,
}

impl Session {
    /// Convenience constructor for a verified session.
    pub fn verified(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: Some(email.into()),
            email_verified: true,
            photo_url: None,
        }
    }
}
