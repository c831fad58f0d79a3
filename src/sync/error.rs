//! Error types for judge synchronization.

use thiserror::Error;

/// Errors that can occur while talking to the judge.
#[derive(Error, Debug)]
pub enum SyncError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Endpoint path, e.g. `/save`
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A verdict was requested for a snapshot the judge never acknowledged
    #[error("Snapshot #{seq} was not acknowledged by the judge")]
    Unacknowledged {
        /// Sequence number the verdict depended on
        seq: u64,
    },

    /// A verdict was requested before any snapshot was pushed
    #[error("No snapshot has been pushed yet")]
    NoSnapshot,

    /// Transport failure reported by a non-HTTP judge
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The background worker is gone
    #[error("Sync worker disconnected")]
    Disconnected,

    /// The background worker could not be started
    #[error("Failed to spawn sync worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SyncError {
    /// Create a transport error with a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
