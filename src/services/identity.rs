// SPDX-License-Identifier: MIT

//! Identity provider over the Firebase Identity Toolkit REST API.
//!
//! Handles:
//! - Session restore from a stored refresh token (sign-in persistence)
//! - Current-session lookup with email-verification flag
//! - Sign-out (local token discard), account deletion, photo updates
//!
//! The session is an explicit value published on a watch channel, never
//! ambient global state.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::{watch, RwLock};

use crate::error::{AppError, Result};
use crate::models::Session;

/// Remote authentication provider seam.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current session, if any. `None` means logged out.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Session-change notifications. The receiver always holds the
    /// latest session value.
    fn watch_sessions(&self) -> watch::Receiver<Option<Session>>;

    /// Terminate the session. For Firebase this is a local token
    /// discard; the refresh token simply stops being used.
    async fn sign_out(&self) -> Result<()>;

    /// Permanently delete the identity record for the current session.
    async fn delete_account(&self) -> Result<()>;

    /// Update the identity-level photo reference.
    async fn update_photo_url(&self, url: &str) -> Result<()>;
}

// ─── Firebase Implementation ─────────────────────────────────────

struct AuthTokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Whether the id token is still usable, with a margin for request
    /// latency.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(60) < self.expires_at
    }
}

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    token_url: String,
    session: Arc<watch::Sender<Option<Session>>>,
    tokens: Arc<RwLock<Option<AuthTokens>>>,
}

impl FirebaseAuth {
    /// Create a client against the production endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_urls(
            api_key,
            "https://identitytoolkit.googleapis.com/v1",
            "https://securetoken.googleapis.com/v1/token",
        )
    }

    /// Create a client against custom endpoints (auth emulator).
    pub fn with_base_urls(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            token_url: token_url.into(),
            session: Arc::new(session),
            tokens: Arc::new(RwLock::new(None)),
        }
    }

    /// Restore a session from a previously persisted refresh token, then
    /// publish it on the session channel.
    pub async fn restore_session(&self, refresh_token: &str) -> Result<Session> {
        let tokens = self.fetch_tokens(refresh_token).await?;

        let session = self.lookup(&tokens.id_token).await?;

        *self.tokens.write().await = Some(tokens);
        self.session.send_replace(Some(session.clone()));

        tracing::info!(uid = %session.uid, verified = session.email_verified, "Session restored");
        Ok(session)
    }

    /// Exchange a refresh token for a fresh id token.
    async fn fetch_tokens(&self, refresh_token: &str) -> Result<AuthTokens> {
        let response = self
            .http
            .post(format!("{}?key={}", self.token_url, self.api_key))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        let refreshed: RefreshResponse = check_response_json(response).await?;
        let ttl_seconds = refreshed.expires_in.parse::<i64>().unwrap_or(3600);

        Ok(AuthTokens {
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        })
    }

    /// accounts:lookup - resolve a session from an ID token.
    async fn lookup(&self, id_token: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.endpoint("accounts:lookup"))
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Account lookup failed: {}", e)))?;

        let lookup: LookupResponse = check_response_json(response).await?;
        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Auth("Account lookup returned no users".to_string()))?;

        Ok(Session {
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
            photo_url: user.photo_url,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}?key={}", self.base_url, method, self.api_key)
    }

    /// The id token for the current session, refreshed with the stored
    /// refresh token when it is about to expire (~1h lifetime).
    async fn current_id_token(&self) -> Result<String> {
        let refresh_token = {
            let tokens = self.tokens.read().await;
            let tokens = tokens.as_ref().ok_or(AppError::Unauthenticated)?;
            if tokens.is_fresh(Utc::now()) {
                return Ok(tokens.id_token.clone());
            }
            tokens.refresh_token.clone()
        };

        let tokens = self.fetch_tokens(&refresh_token).await?;
        let id_token = tokens.id_token.clone();
        *self.tokens.write().await = Some(tokens);
        tracing::debug!("Refreshed expired id token");
        Ok(id_token)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    fn watch_sessions(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        *self.tokens.write().await = None;
        self.session.send_replace(None);
        tracing::info!("Signed out");
        Ok(())
    }

    async fn delete_account(&self) -> Result<()> {
        let id_token = self.current_id_token().await?;

        let response = self
            .http
            .post(self.endpoint("accounts:delete"))
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Account deletion failed: {}", e)))?;

        check_response(response).await?;

        *self.tokens.write().await = None;
        self.session.send_replace(None);
        tracing::info!("Identity record deleted");
        Ok(())
    }

    async fn update_photo_url(&self, url: &str) -> Result<()> {
        let id_token = self.current_id_token().await?;

        let response = self
            .http
            .post(self.endpoint("accounts:update"))
            .json(&serde_json::json!({
                "idToken": id_token,
                "photoUrl": url,
                "returnSecureToken": false,
            }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Photo update failed: {}", e)))?;

        check_response(response).await?;

        let url = url.to_string();
        self.session.send_modify(|session| {
            if let Some(session) = session {
                session.photo_url = Some(url);
            }
        });
        Ok(())
    }
}

async fn check_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Auth(format!("{}: {}", status, body)))
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Auth(format!("{}: {}", status, body)));
    }
    response
        .json()
        .await
        .map_err(|e| AppError::Decode(format!("identity response: {}", e)))
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(rename = "id_token")]
    id_token: String,
    #[serde(rename = "refresh_token")]
    refresh_token: String,
    /// Lifetime in seconds; the secure-token endpoint sends it as text.
    #[serde(rename = "expires_in")]
    expires_in: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    photo_url: Option<String>,
}

// ─── In-Memory Implementation ────────────────────────────────────

/// In-memory identity provider for tests. Clones share state.
#[derive(Clone)]
pub struct MemoryIdentity {
    inner: Arc<IdentityInner>,
}

struct IdentityInner {
    session: watch::Sender<Option<Session>>,
    fail_sign_out: std::sync::atomic::AtomicBool,
    fail_delete: std::sync::atomic::AtomicBool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            inner: Arc::new(IdentityInner {
                session,
                fail_sign_out: std::sync::atomic::AtomicBool::new(false),
                fail_delete: std::sync::atomic::AtomicBool::new(false),
            }),
        }
    }

    /// Install (or clear) the current session.
    pub fn set_session(&self, session: Option<Session>) {
        self.inner.session.send_replace(session);
    }

    /// Make subsequent sign-out calls fail.
    pub fn fail_sign_out(&self, fail: bool) {
        self.inner
            .fail_sign_out
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make subsequent identity deletions fail.
    pub fn fail_delete(&self, fail: bool) {
        self.inner
            .fail_delete
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.inner.session.borrow().clone())
    }

    fn watch_sessions(&self) -> watch::Receiver<Option<Session>> {
        self.inner.session.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        if self.inner.fail_sign_out.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Auth("injected sign-out failure".to_string()));
        }
        self.inner.session.send_replace(None);
        Ok(())
    }

    async fn delete_account(&self) -> Result<()> {
        if self.inner.fail_delete.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Auth("injected deletion failure".to_string()));
        }
        self.inner.session.send_replace(None);
        Ok(())
    }

    async fn update_photo_url(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.inner.session.send_modify(|session| {
            if let Some(session) = session {
                session.photo_url = Some(url);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_changes_reach_watchers() {
        let identity = MemoryIdentity::new();
        let mut watcher = identity.watch_sessions();

        identity.set_session(Some(Session::verified("u1", "u1@example.com")));
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow().as_ref().unwrap().uid, "u1");

        identity.sign_out().await.unwrap();
        watcher.changed().await.unwrap();
        assert!(watcher.borrow().is_none());
    }

    #[test]
    fn id_token_freshness_window() {
        let issued = Utc::now();
        let tokens = AuthTokens {
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: issued + Duration::hours(1),
        };

        assert!(tokens.is_fresh(issued));
        // Inside the 60s latency margin the token counts as expired.
        assert!(!tokens.is_fresh(issued + Duration::minutes(59)));
        assert!(!tokens.is_fresh(issued + Duration::hours(2)));
    }

    #[tokio::test]
    async fn photo_update_is_reflected_in_session() {
        let identity = MemoryIdentity::new();
        identity.set_session(Some(Session::verified("u1", "u1@example.com")));

        identity
            .update_photo_url("https://example.com/p.png")
            .await
            .unwrap();

        let session = identity.current_session().await.unwrap().unwrap();
        assert_eq!(session.photo_url.as_deref(), Some("https://example.com/p.png"));
    }
}
