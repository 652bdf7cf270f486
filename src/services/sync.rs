// SPDX-License-Identifier: MIT

//! Profile sync policy.
//!
//! Produces the single authoritative in-memory profile for the UI and
//! keeps it consistent with the remote store across restarts, edits,
//! sign-outs and account deletion, tolerating offline and slow-network
//! conditions via the local mirror.
//!
//! Precedence: a cached mirror snapshot is served as-is (stale-allowed,
//! no forced remote round-trip). Only a mirror miss consults the
//! session and the remote store, and a fresh remote read always
//! overwrites the mirror wholesale - mirror and remote state are never
//! merged client-side.

use std::time::Duration;

use validator::Validate;

use crate::error::{AppError, Result};
use crate::mirror::{keys, BannerKind, LocalMirror, SessionFlags};
use crate::models::{ProfileUpdate, Session, UserProfile};
use crate::services::blobs::BlobStore;
use crate::services::identity::IdentityProvider;
use crate::store::ProfileStore;

/// Saga step of the account-deletion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    /// Remote profile document delete
    Profile,
    /// Identity record delete
    Identity,
    /// Full local mirror clear
    Mirror,
}

/// Outcome of the account-deletion saga.
///
/// The sequence is best-effort with no rollback: each completed step is
/// recorded so a retry can resume from the step that failed instead of
/// silently leaving partial state.
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub profile_deleted: bool,
    pub identity_deleted: bool,
    pub mirror_cleared: bool,
    /// The error that stopped the saga, if any.
    pub error: Option<AppError>,
}

impl DeletionReport {
    /// Returns true if every step completed.
    pub fn is_complete(&self) -> bool {
        self.profile_deleted && self.identity_deleted && self.mirror_cleared
    }

    /// The first step that has not completed, in saga order.
    pub fn first_incomplete_step(&self) -> Option<DeleteStep> {
        if !self.profile_deleted {
            Some(DeleteStep::Profile)
        } else if !self.identity_deleted {
            Some(DeleteStep::Identity)
        } else if !self.mirror_cleared {
            Some(DeleteStep::Mirror)
        } else {
            None
        }
    }
}

/// The profile sync policy over its four collaborator seams.
pub struct ProfileSync<S, I, B, M> {
    store: S,
    identity: I,
    blobs: B,
    mirror: M,
    load_timeout: Duration,
}

impl<S, I, B, M> ProfileSync<S, I, B, M>
where
    S: ProfileStore,
    I: IdentityProvider,
    B: BlobStore,
    M: LocalMirror,
{
    pub fn new(store: S, identity: I, blobs: B, mirror: M, load_timeout: Duration) -> Self {
        Self {
            store,
            identity,
            blobs,
            mirror,
            load_timeout,
        }
    }

    /// One-shot flag channel shared with the presentation layer.
    pub fn flags(&self) -> SessionFlags<'_, M> {
        SessionFlags::new(&self.mirror)
    }

    // ─── Load ────────────────────────────────────────────────────

    /// Resolve the current profile.
    ///
    /// Mirror hit: returned immediately, stale-allowed, no remote call.
    /// Mirror miss: requires a verified session; the remote document is
    /// fetched, fully overwrites the mirror, and is returned. `None`
    /// means logged out (or unverified).
    ///
    /// The remote path is bounded by the configured timeout. On expiry
    /// the pending future is dropped - the request is genuinely
    /// cancelled, not just hidden from the UI - and `Timeout` is
    /// returned so the caller can clear its loading state.
    pub async fn load_profile(&self) -> Result<Option<UserProfile>> {
        if let Some(profile) = self.read_mirror().await {
            tracing::debug!("Profile served from mirror");
            return Ok(Some(profile));
        }

        match tokio::time::timeout(self.load_timeout, self.load_remote()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "Timed out loading user profile"
                );
                Err(AppError::Timeout)
            }
        }
    }

    async fn load_remote(&self) -> Result<Option<UserProfile>> {
        let Some(session) = self.identity.current_session().await? else {
            return Ok(None);
        };
        if !session.email_verified {
            tracing::debug!(uid = %session.uid, "Session not verified, treating as logged out");
            return Ok(None);
        }

        match self.store.get_profile(&session.uid).await? {
            Some(profile) => {
                self.overwrite_mirror(&profile).await;
                Ok(Some(profile))
            }
            None => Err(AppError::NotFound(format!(
                "no profile data found for user {}",
                session.uid
            ))),
        }
    }

    // ─── Save ────────────────────────────────────────────────────

    /// Merge-write a partial update, remote first.
    ///
    /// The remote write gates everything: on failure the mirror is left
    /// untouched and no flags are set. On success the update is
    /// shallow-merged onto the previous mirror contents (or the remote
    /// document, when the mirror is cold), the mirror is overwritten,
    /// and the one-shot success banner plus force-reload flag are set
    /// for the next screen. Returns the merged profile.
    pub async fn save_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        update
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if update.is_empty() {
            return Err(AppError::BadRequest("no fields to update".to_string()));
        }

        let session = self.require_session().await?;

        self.store.merge_profile(&session.uid, update).await?;
        tracing::info!(uid = %session.uid, "Profile saved");

        let mut merged = self.merge_base(&session.uid).await;
        update.apply_to(&mut merged);
        self.overwrite_mirror(&merged).await;

        let flags = self.flags();
        if let Err(e) = flags.set_banner(BannerKind::Success, "Profile updated").await {
            tracing::warn!(error = %e, "Failed to set success banner");
        }
        if let Err(e) = flags.set_force_reload().await {
            tracing::warn!(error = %e, "Failed to set force-reload flag");
        }

        Ok(merged)
    }

    // ─── Sign Out ────────────────────────────────────────────────

    /// Terminate the session and drop the cached profile.
    ///
    /// The two steps are independent best-effort actions, not a
    /// transaction: each may fail without blocking the other. Failures
    /// are logged and surfaced as a generic error banner; the caller is
    /// free to navigate away regardless.
    pub async fn sign_out(&self) -> Result<()> {
        let (session_result, mirror_result) = futures_util::future::join(
            self.identity.sign_out(),
            self.mirror.remove(keys::USER_DATA),
        )
        .await;

        let mut failed = false;
        if let Err(e) = &session_result {
            tracing::error!(error = %e, "Failed to terminate session");
            failed = true;
        }
        if let Err(e) = &mirror_result {
            tracing::error!(error = %e, "Failed to drop cached profile");
            failed = true;
        }

        let flags = self.flags();
        let banner = if failed {
            flags.set_banner(BannerKind::Error, "Sign out failed").await
        } else {
            flags.set_banner(BannerKind::Success, "Signed out").await
        };
        if let Err(e) = banner {
            tracing::warn!(error = %e, "Failed to set sign-out banner");
        }

        Ok(())
    }

    // ─── Account Deletion ────────────────────────────────────────

    /// Delete the account: remote profile document, identity record,
    /// then the entire local mirror, in that order.
    ///
    /// Identity deletion is only attempted after the document delete
    /// succeeds, so a document is never orphaned without a deletable
    /// owner. There is no rollback; the report records how far the saga
    /// got so a retry resumes at the failed step.
    ///
    /// `confirmed` is the destructive-action gate: the caller must have
    /// collected an explicit user confirmation.
    pub async fn delete_account(&self, confirmed: bool) -> Result<DeletionReport> {
        if !confirmed {
            return Err(AppError::BadRequest(
                "account deletion requires explicit confirmation".to_string(),
            ));
        }

        let session = self.require_session().await?;
        let mut report = DeletionReport::default();

        match self.store.delete_profile(&session.uid).await {
            Ok(()) => report.profile_deleted = true,
            Err(e) => {
                tracing::error!(uid = %session.uid, error = %e, "Account deletion stopped: profile document delete failed");
                report.error = Some(e);
                return Ok(report);
            }
        }

        match self.identity.delete_account().await {
            Ok(()) => report.identity_deleted = true,
            Err(e) => {
                tracing::error!(uid = %session.uid, error = %e, "Account deletion stopped: identity delete failed, profile document already gone");
                report.error = Some(e);
                return Ok(report);
            }
        }

        match self.mirror.clear().await {
            Ok(()) => report.mirror_cleared = true,
            Err(e) => {
                tracing::error!(uid = %session.uid, error = %e, "Account deletion: mirror clear failed");
                report.error = Some(e);
                return Ok(report);
            }
        }

        tracing::info!(uid = %session.uid, "Account deletion complete");
        Ok(report)
    }

    // ─── Profile Image ───────────────────────────────────────────

    /// Upload a profile picture and propagate its URL everywhere.
    ///
    /// Sequence: blob upload, identity photo reference, profile
    /// document merge, mirror. A failure after the identity update
    /// leaves identity- and document-level references inconsistent;
    /// that gap is logged and the error returned, with no retry or
    /// rollback here.
    pub async fn upload_profile_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UserProfile> {
        let session = self.require_session().await?;

        let path = format!("profile_pictures/{}", file_name);
        let url = self.blobs.upload(&path, bytes, content_type).await?;

        self.identity.update_photo_url(&url).await?;

        let update = ProfileUpdate {
            photo_url: Some(url.clone()),
            ..Default::default()
        };
        if let Err(e) = self.store.merge_profile(&session.uid, &update).await {
            tracing::error!(
                uid = %session.uid,
                error = %e,
                "Photo document merge failed after identity update; photo references are now inconsistent"
            );
            return Err(e);
        }

        let mut merged = self.merge_base(&session.uid).await;
        merged.photo_url = Some(url);
        self.overwrite_mirror(&merged).await;

        tracing::info!(uid = %session.uid, "Profile photo updated");
        Ok(merged)
    }

    // ─── Helpers ─────────────────────────────────────────────────

    async fn require_session(&self) -> Result<Session> {
        self.identity
            .current_session()
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    /// Read the cached profile. Read or parse failures degrade to "no
    /// cached profile" rather than propagating.
    async fn read_mirror(&self) -> Option<UserProfile> {
        let raw = match self.mirror.get(keys::USER_DATA).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Mirror read failed, ignoring cache");
                return None;
            }
        };
        match UserProfile::from_json_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Cached profile unparseable, ignoring cache");
                None
            }
        }
    }

    /// Base state for the post-write mirror refresh: the cached profile,
    /// or the remote document when the mirror is cold. The remote
    /// fallback keeps the cache as wide as the document instead of
    /// caching only the update's fields.
    async fn merge_base(&self, uid: &str) -> UserProfile {
        if let Some(profile) = self.read_mirror().await {
            return profile;
        }
        match self.store.get_profile(uid).await {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default(),
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Remote re-read for mirror refresh failed, caching the update only");
                UserProfile::default()
            }
        }
    }

    /// Best-effort full overwrite of the cached profile. A cache write
    /// failure is logged, never surfaced: the remote store already
    /// holds the truth.
    async fn overwrite_mirror(&self, profile: &UserProfile) {
        let encoded = match profile.to_json_string() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode profile for mirror");
                return;
            }
        };
        if let Err(e) = self.mirror.set(keys::USER_DATA, &encoded).await {
            tracing::warn!(error = %e, "Failed to write profile to mirror");
        }
    }
}
