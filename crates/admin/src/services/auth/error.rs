//! Auth context error types.

use thiserror::Error;

/// Errors that can occur while reading or writing authentication state.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request did not pass through the session layer.
    #[error("session layer is not installed")]
    MissingSession,

    /// Session storage failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
