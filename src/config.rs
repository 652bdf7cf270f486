//! Application configuration loaded from environment variables.
//!
//! Only the Firebase project coordinates are required; everything else
//! has a sensible default so the probe binary runs against an emulator
//! with a minimal `.env`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// How long `load_profile` may keep the caller waiting on the remote
/// path before resolving with a timeout error.
pub const PROFILE_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cadence for the Firestore post-feed change poller.
pub const POSTS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP / Firebase project ID
    pub firebase_project_id: String,
    /// Firebase Web API key (public, used for Identity Toolkit calls)
    pub firebase_api_key: String,
    /// Cloud Storage bucket for profile pictures
    pub storage_bucket: String,
    /// Location of the on-device mirror file
    pub mirror_path: PathBuf,
    /// Profile load timeout
    pub load_timeout: Duration,
    /// Post feed poll interval
    pub posts_poll_interval: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            firebase_api_key: "test-api-key".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            mirror_path: PathBuf::from("growlog-mirror.json"),
            load_timeout: PROFILE_LOAD_TIMEOUT,
            posts_poll_interval: POSTS_POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        Ok(Self {
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", firebase_project_id)),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            mirror_path: env::var("MIRROR_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("growlog-mirror.json")),
            load_timeout: duration_ms_var("PROFILE_LOAD_TIMEOUT_MS", PROFILE_LOAD_TIMEOUT)?,
            posts_poll_interval: duration_ms_var("POSTS_POLL_INTERVAL_MS", POSTS_POLL_INTERVAL)?,
            firebase_project_id,
        })
    }
}

fn duration_ms_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Process environment is shared across test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("FIREBASE_PROJECT_ID", "growlog-test");
        env::set_var("FIREBASE_API_KEY", "key-123");
        env::remove_var("FIREBASE_STORAGE_BUCKET");
        env::remove_var("PROFILE_LOAD_TIMEOUT_MS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_project_id, "growlog-test");
        assert_eq!(config.storage_bucket, "growlog-test.appspot.com");
        assert_eq!(config.load_timeout, PROFILE_LOAD_TIMEOUT);
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("FIREBASE_PROJECT_ID", "growlog-test");
        env::set_var("FIREBASE_API_KEY", "key-123");
        env::set_var("POSTS_POLL_INTERVAL_MS", "not-a-number");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("POSTS_POLL_INTERVAL_MS")));

        env::remove_var("POSTS_POLL_INTERVAL_MS");
    }
}
