// SPDX-License-Identifier: MIT

//! Sync probe binary.
//!
//! Wires the production collaborators together, runs one `load_profile`
//! pass and takes one post-feed snapshot. Useful against the Firestore
//! emulator (set FIRESTORE_EMULATOR_HOST) or a live project; set
//! REFRESH_TOKEN to restore a session first.

use growlog_client::{
    config::Config,
    mirror::FileMirror,
    services::{FirebaseAuth, FirebaseStorage, PostFeed, ProfileSync},
    store::FirestoreDb,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(project = %config.firebase_project_id, "Starting GrowLog sync probe");

    let db = FirestoreDb::new(&config.firebase_project_id).await?;
    let auth = FirebaseAuth::new(&config.firebase_api_key);
    let blobs = FirebaseStorage::new(&config.storage_bucket);
    let mirror = FileMirror::open(&config.mirror_path).await?;

    if let Ok(refresh_token) = std::env::var("REFRESH_TOKEN") {
        let session = auth.restore_session(&refresh_token).await?;
        tracing::info!(uid = %session.uid, "Session restored from refresh token");
    }

    let feed_ticker = db.start_feed_ticker(config.posts_poll_interval);
    let feed = PostFeed::new(db.clone());

    let sync = ProfileSync::new(db, auth, blobs, mirror, config.load_timeout);

    match sync.load_profile().await {
        Ok(Some(profile)) => {
            tracing::info!(
                display_name = ?profile.display_name,
                city = ?profile.city,
                "Profile loaded"
            );
        }
        Ok(None) => tracing::info!("No session (or unverified); nothing to load"),
        Err(e) => tracing::error!(error = %e, "Profile load failed"),
    }

    let mut posts = feed.subscribe();
    match posts.recv().await {
        Ok(Some(snapshot)) => tracing::info!(posts = snapshot.len(), "Post feed snapshot"),
        Ok(None) => tracing::info!("Post feed closed"),
        Err(e) => tracing::error!(error = %e, "Post feed listing failed"),
    }
    feed_ticker.abort();

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("growlog_client=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
