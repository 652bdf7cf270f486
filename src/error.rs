// SPDX-License-Identifier: MIT

//! Application error types.
//!
//! Every remote-call failure is converted into a variant here at the call
//! site and surfaced to the UI layer as a non-fatal signal. Local mirror
//! read failures are not in this taxonomy at all: they degrade to "no
//! cached value" inside the mirror module.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Identity provider error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("Local mirror error: {0}")]
    Mirror(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("No authenticated session")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether re-running the operation could plausibly succeed without
    /// any other state change (used by callers to decide whether to offer
    /// a retry affordance).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Auth(_) | AppError::Database(_) | AppError::Blob(_) | AppError::Timeout
        )
    }

    /// Whether the error means the user must sign in (or verify their
    /// email) before the operation can succeed.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AppError::Unauthenticated)
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_covers_remote_failures() {
        assert!(AppError::Database("unavailable".to_string()).is_retryable());
        assert!(AppError::Auth("503".to_string()).is_retryable());
        assert!(AppError::Timeout.is_retryable());
    }

    #[test]
    fn not_retryable_without_state_change() {
        assert!(!AppError::Unauthenticated.is_retryable());
        assert!(!AppError::BadRequest("empty update".to_string()).is_retryable());
        assert!(!AppError::NotFound("users/abc".to_string()).is_retryable());
        assert!(!AppError::Decode("user profile".to_string()).is_retryable());
    }

    #[test]
    fn unauthenticated_predicate() {
        assert!(AppError::Unauthenticated.is_unauthenticated());
        assert!(!AppError::Timeout.is_unauthenticated());
    }
}
