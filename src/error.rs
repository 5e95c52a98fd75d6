//! Error types for the entitlement engine.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Feed exhausted")]
    FeedExhausted,

    #[error("A page fetch is already in flight")]
    FetchInFlight,

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Amount must be finite, got {0}")]
    NonFiniteAmount(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Unsupported persisted version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Storage is locked by another process")]
    Locked,

    #[error("Storage not initialized")]
    NotInitialized,
}

impl EngineError {
    /// Whether the caller should simply stop paginating rather than report a failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, EngineError::FeedExhausted)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

/// Failure talking to the content, subscription or permissions service.
///
/// Never retried by the engine; last-known-good state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("not authenticated")]
    Unauthenticated,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
