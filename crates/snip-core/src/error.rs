use thiserror::Error;

/// Errors raised while constructing core types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Errors signalled by a [`Repository`](crate::Repository) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("record has expired: {0}")]
    Expired(String),
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns `true` for outcomes that callers treat as "no live record".
    pub fn is_absent(&self) -> bool {
        matches!(self, StorageError::NotFound(_) | StorageError::Expired(_))
    }
}

/// Errors surfaced by the shortening coordinator.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),
    #[error("short code not found")]
    NotFound,
    #[error("failed to generate a unique code after {attempts} attempts")]
    TooManyCollisions { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
