//! Error types for the wall display bridge.

use thiserror::Error;

/// Result type for wall display operations.
pub type Result<T> = std::result::Result<T, WallDisplayError>;

/// Error type for wall display operations.
#[derive(Debug, Error)]
pub enum WallDisplayError {
    /// Login rejected or the host could not be reached while logging in.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (unreachable host, non-success status).
    #[error("Connection error: {0}")]
    Connection(String),

    /// A JSON endpoint returned something that is not the expected JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The server still reported an expired session after re-login.
    #[error("Session expired and re-login did not restore it")]
    SessionExpired,

    /// No item with this unique key in the latest snapshot.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The requested action does not apply to the item.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Other error
    #[error("Wall display error: {0}")]
    Other(#[from] anyhow::Error),
}

impl WallDisplayError {
    /// Whether the error means the items should be shown as unavailable
    /// rather than reported to the user as a credential problem.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::MalformedResponse(_) | Self::SessionExpired
        )
    }
}
