use crate::repository::UrlRecord;
use async_trait::async_trait;
use jiff::Timestamp;
use std::time::Duration;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    Never,
    /// The shortened URL expires after a certain duration from now.
    AfterDuration(Duration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// The expiration policy for a newly created record.
    /// `None` applies the service's default TTL.
    pub expiration: Option<ExpirationPolicy>,
}

impl ShortenParams {
    /// Parameters using the default expiration policy.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: ExpirationPolicy) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Outcome of a shorten call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    /// The live record for the URL.
    pub record: UrlRecord,
    /// The full short link, composed from the configured base URL.
    pub short_url: String,
    /// `true` if this call created the record, `false` if it already existed.
    pub created: bool,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the live record for the URL, creating one if none exists.
    async fn shorten(&self, params: ShortenParams) -> Result<Shortened>;

    /// Resolves a short code to its stored URL record.
    ///
    /// Malformed, missing and expired codes all yield
    /// [`ShortenerError::NotFound`](crate::ShortenerError::NotFound).
    async fn resolve(&self, code: &str) -> Result<UrlRecord>;
}
