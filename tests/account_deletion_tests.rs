// SPDX-License-Identifier: MIT

//! Account-deletion saga: ordering, the confirmation gate, and
//! resumable partial failure.

mod common;

use common::{memory_sync, profile, verified_session};
use growlog_client::mirror::{keys, LocalMirror};
use growlog_client::services::{DeleteStep, IdentityProvider};
use growlog_client::store::ProfileStore;
use growlog_client::AppError;

#[tokio::test]
async fn deletion_requires_explicit_confirmation() {
    let (sync, store, identity, _blobs, _mirror) = memory_sync();

    store.seed_profile("u1", profile("Alex", "hi"));
    identity.set_session(Some(verified_session("u1")));

    let err = sync.delete_account(false).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Nothing was touched.
    assert!(store.get_profile("u1").await.unwrap().is_some());
    assert!(identity.current_session().await.unwrap().is_some());
}

#[tokio::test]
async fn confirmed_deletion_removes_everything() {
    let (sync, store, identity, _blobs, mirror) = memory_sync();

    store.seed_profile("u1", profile("Alex", "hi"));
    identity.set_session(Some(verified_session("u1")));
    mirror
        .set(keys::USER_DATA, &profile("Alex", "hi").to_json_string().unwrap())
        .await
        .unwrap();
    mirror.set(keys::BANNER_MESSAGE, "stale").await.unwrap();

    let report = sync.delete_account(true).await.unwrap();

    assert!(report.is_complete());
    assert!(report.error.is_none());
    assert_eq!(report.first_incomplete_step(), None);

    assert!(store.get_profile("u1").await.unwrap().is_none());
    assert!(identity.current_session().await.unwrap().is_none());
    // The whole mirror is purged, not just the profile key.
    assert!(mirror.is_empty());
}

#[tokio::test]
async fn profile_delete_failure_stops_the_saga_before_identity() {
    let (sync, store, identity, _blobs, mirror) = memory_sync();

    store.seed_profile("u1", profile("Alex", "hi"));
    identity.set_session(Some(verified_session("u1")));
    mirror
        .set(keys::USER_DATA, &profile("Alex", "hi").to_json_string().unwrap())
        .await
        .unwrap();
    store.fail_deletes(true);

    let report = sync.delete_account(true).await.unwrap();

    assert!(!report.profile_deleted);
    assert!(!report.identity_deleted);
    assert!(!report.mirror_cleared);
    assert!(report.error.is_some());
    assert_eq!(report.first_incomplete_step(), Some(DeleteStep::Profile));

    // The identity record survives untouched.
    assert!(identity.current_session().await.unwrap().is_some());
    assert!(!mirror.is_empty());
}

#[tokio::test]
async fn identity_delete_failure_records_completed_steps() {
    let (sync, store, identity, _blobs, mirror) = memory_sync();

    store.seed_profile("u1", profile("Alex", "hi"));
    identity.set_session(Some(verified_session("u1")));
    mirror
        .set(keys::USER_DATA, &profile("Alex", "hi").to_json_string().unwrap())
        .await
        .unwrap();
    identity.fail_delete(true);

    let report = sync.delete_account(true).await.unwrap();

    assert!(report.profile_deleted);
    assert!(!report.identity_deleted);
    assert!(!report.mirror_cleared);
    assert_eq!(report.first_incomplete_step(), Some(DeleteStep::Identity));

    // The document really is gone, with no rollback.
    assert!(store.get_profile("u1").await.unwrap().is_none());
    // The mirror was not cleared: the saga stopped at identity.
    assert!(!mirror.is_empty());
}

#[tokio::test]
async fn retry_resumes_after_identity_failure() {
    let (sync, store, identity, _blobs, mirror) = memory_sync();

    store.seed_profile("u1", profile("Alex", "hi"));
    identity.set_session(Some(verified_session("u1")));
    mirror
        .set(keys::USER_DATA, &profile("Alex", "hi").to_json_string().unwrap())
        .await
        .unwrap();

    identity.fail_delete(true);
    let first = sync.delete_account(true).await.unwrap();
    assert_eq!(first.first_incomplete_step(), Some(DeleteStep::Identity));

    // Retry once the provider recovers. The profile delete re-runs and
    // is idempotent.
    identity.fail_delete(false);
    let second = sync.delete_account(true).await.unwrap();

    assert!(second.is_complete());
    assert!(identity.current_session().await.unwrap().is_none());
    assert!(mirror.is_empty());
}

#[tokio::test]
async fn deletion_without_session_is_unauthenticated() {
    let (sync, _store, _identity, _blobs, _mirror) = memory_sync();

    let err = sync.delete_account(true).await.unwrap_err();
    assert!(err.is_unauthenticated());
}
