// ================================================================
// File: rewardsync-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    /// A create/update/fulfill/cancel call against the remote channel
    /// service failed.
    #[error("Remote channel service error: {0}")]
    Remote(String),

    /// The remote service rejected a reward creation because a reward with
    /// the same title already exists on the channel.
    #[error("Duplicate reward title on remote channel: {0}")]
    DuplicateReward(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// A user-supplied redemption callback returned an error. Always caught
    /// and logged by the dispatch loop, never propagated out of it.
    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Event queue error: {0}")]
    Queue(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Remote(e.to_string())
    }
}
