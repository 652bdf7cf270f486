// SPDX-License-Identifier: MIT

//! Integration tests for the Firestore store.
//!
//! These tests require the Firestore emulator to be running; they are
//! skipped when FIRESTORE_EMULATOR_HOST is not set.

use std::time::Duration;

use growlog_client::models::{PostDraft, ProfileUpdate};
use growlog_client::services::PostFeed;
use growlog_client::store::{FirestoreDb, PostStore, ProfileStore};

/// Check if emulator is available via environment variable.
fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
macro_rules! require_emulator {
    () => {
        if !emulator_available() {
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project").await.unwrap()
}

/// Generate a unique uid for test isolation.
fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-user-{}", nanos)
}

#[tokio::test]
async fn test_profile_merge_get_delete() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid();

    assert!(db.get_profile(&uid).await.unwrap().is_none());

    let update = ProfileUpdate {
        display_name: Some("Integration".to_string()),
        bio: Some("created by test".to_string()),
        ..Default::default()
    };
    db.merge_profile(&uid, &update).await.unwrap();

    let profile = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Integration"));

    // A second merge must not drop the unlisted fields.
    let update = ProfileUpdate {
        city: Some("Osaka".to_string()),
        ..Default::default()
    };
    db.merge_profile(&uid, &update).await.unwrap();

    let profile = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Integration"));
    assert_eq!(profile.city.as_deref(), Some("Osaka"));

    db.delete_profile(&uid).await.unwrap();
    assert!(db.get_profile(&uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_insert_gets_generated_id() {
    require_emulator!();
    let db = test_db().await;

    let created = db.add_post(&PostDraft::new("emulator post")).await.unwrap();
    assert!(!created.id.is_empty());

    let posts = db.list_posts().await.unwrap();
    assert!(posts.iter().any(|p| p.id == created.id));
}

#[tokio::test]
async fn test_offline_mock_reports_database_error() {
    let db = FirestoreDb::new_mock();
    let err = db.get_profile("anyone").await.unwrap_err();
    assert!(matches!(err, growlog_client::AppError::Database(_)));
}

#[tokio::test(start_paused = true)]
async fn test_feed_ticker_wakes_change_subscribers() {
    // The signal path is independent of the connection, so the offline
    // client is enough here.
    let db = FirestoreDb::new_mock();
    let mut changes = db.changes();

    let ticker = db.start_feed_ticker(Duration::from_millis(100));
    changes.changed().await.unwrap();
    ticker.abort();
}

#[tokio::test]
async fn test_cross_client_post_reaches_live_feed() {
    require_emulator!();
    let writer = test_db().await;
    let reader = test_db().await;

    // The reader never writes; only the ticker can surface the change.
    let ticker = reader.start_feed_ticker(Duration::from_millis(200));
    let feed = PostFeed::new(reader);
    let mut sub = feed.subscribe();
    let _ = sub.recv().await.unwrap();

    let created = writer
        .add_post(&PostDraft::new("written elsewhere"))
        .await
        .unwrap();

    let snapshot = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = sub.recv().await.unwrap().unwrap();
            if snapshot.iter().any(|p| p.id == created.id) {
                return snapshot;
            }
        }
    })
    .await
    .expect("cross-client post within deadline");

    assert!(snapshot.iter().any(|p| p.text == "written elsewhere"));
    ticker.abort();
}
