//! Error types for the persistence layer.
//!
//! Backends report failures through [`StoreError`]. The typed helpers in
//! [`crate::json`] convert these into log lines and defaults; only the
//! backends themselves and callers that opt in see the raw error.

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {key}: {source}")]
    Io {
        /// The key being read or written.
        key: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key contains characters that cannot be mapped to storage.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
