//! Ledger fetch errors
//!
//! Fetch failures are surfaced to the caller unchanged; the engine never
//! retries them.

use thiserror::Error;

/// Result type for ledger operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Ledger client errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No block with this number
    #[error("Block {0} not found")]
    BlockNotFound(u64),

    /// No block with this previous hash
    #[error("No block with previous hash {0}")]
    HashNotFound(String),

    /// No block contains this entry
    #[error("No block contains entry '{0}'")]
    EntryNotFound(String),

    /// Network or peer failure
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Identity could not be enrolled
    #[error("Enrollment of '{user}' failed: {reason}")]
    Enrollment { user: String, reason: String },

    /// Ledger returned data that could not be decoded
    #[error("Malformed ledger data: {0}")]
    Decode(String),

    /// Ledger serves a different channel than the one configured
    #[error("Block {block} belongs to channel '{found}', expected '{expected}'")]
    ChannelMismatch {
        expected: String,
        found: String,
        block: u64,
    },
}

impl FetchError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::BlockNotFound(_)
            | FetchError::HashNotFound(_)
            | FetchError::EntryNotFound(_) => "LQL_FETCH_NOT_FOUND",
            FetchError::Unavailable(_) => "LQL_FETCH_UNAVAILABLE",
            FetchError::Enrollment { .. } => "LQL_FETCH_ENROLLMENT",
            FetchError::Decode(_) => "LQL_FETCH_DECODE",
            FetchError::ChannelMismatch { .. } => "LQL_FETCH_CHANNEL_MISMATCH",
        }
    }

    /// Returns true when the requested block simply does not exist
    pub fn is_not_found(&self) -> bool {
        self.code() == "LQL_FETCH_NOT_FOUND"
    }
}
