use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Longest original URL, in characters, any backend stores.
pub const MAX_URL_LENGTH: usize = 2048;

/// A stored URL record.
///
/// Records are immutable once created. Expiration is logical: an expired
/// record stays in the backend but every lookup treats it as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The short code identifying this record.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
}

impl UrlRecord {
    /// Returns `true` if the record has expired as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Returns `true` if `now` is strictly after the expiration timestamp.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Rejects records no backend can store verbatim.
    pub fn check_storable(&self) -> Result<()> {
        let length = self.original_url.chars().count();
        if length > MAX_URL_LENGTH {
            return Err(StorageError::InvalidData(format!(
                "original URL is {length} characters, limit is {MAX_URL_LENGTH}"
            )));
        }
        Ok(())
    }
}

/// Storage contract shared by every backend.
///
/// All backends must behave identically for fresh inserts, idempotent
/// re-inserts, colliding inserts, and expired or missing lookups.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Persists a record.
    ///
    /// Atomic with respect to the uniqueness of `record.code`:
    /// - a live record with the same code and the same URL makes this a no-op success;
    /// - a live record with the same code and a different URL yields [`StorageError::Conflict`];
    /// - an expired record holding the code is replaced;
    /// - a URL longer than [`MAX_URL_LENGTH`] yields [`StorageError::InvalidData`].
    async fn save(&self, record: &UrlRecord) -> Result<()>;

    /// Retrieves the record for a short code.
    ///
    /// Returns [`StorageError::NotFound`] if no record exists and
    /// [`StorageError::Expired`] if it exists but has expired.
    async fn get_by_code(&self, code: &ShortCode) -> Result<UrlRecord>;

    /// Retrieves the record for an original URL, with the same expiration
    /// semantics as [`Repository::get_by_code`].
    async fn get_by_original_url(&self, original_url: &str) -> Result<UrlRecord>;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn record(expires_at: Option<Timestamp>) -> UrlRecord {
        UrlRecord {
            code: ShortCode::new_unchecked("abcdefghij"),
            original_url: "https://example.com".to_string(),
            created_at: Timestamp::now(),
            expires_at,
        }
    }

    #[test]
    fn never_expires_without_timestamp() {
        assert!(!record(None).is_expired());
    }

    #[test]
    fn past_timestamp_is_expired() {
        let past = Timestamp::now() - SignedDuration::from_secs(1);
        assert!(record(Some(past)).is_expired());
    }

    #[test]
    fn future_timestamp_is_live() {
        let future = Timestamp::now() + SignedDuration::from_hours(1);
        assert!(!record(Some(future)).is_expired());
    }

    #[test]
    fn expiration_is_strict() {
        let at = Timestamp::from_second(1_700_000_000).unwrap();
        let r = record(Some(at));
        assert!(!r.is_expired_at(at));
        assert!(r.is_expired_at(at + SignedDuration::from_nanos(1)));
    }

    #[test]
    fn url_length_limit_counts_characters() {
        let mut r = record(None);

        r.original_url = format!("https://example.com/{}", "é".repeat(MAX_URL_LENGTH - 20));
        assert_eq!(r.original_url.chars().count(), MAX_URL_LENGTH);
        assert!(r.check_storable().is_ok());

        r.original_url.push('x');
        assert!(matches!(
            r.check_storable(),
            Err(StorageError::InvalidData(_))
        ));
    }
}
