use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use snip_core::Shortened;

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    /// A missing field reads as empty and is reported as such.
    #[serde(default)]
    pub url: String,
    /// Lifetime of a newly created link. Absent uses the server default,
    /// zero never expires.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl From<Shortened> for ShortenResponse {
    fn from(shortened: Shortened) -> Self {
        Self {
            short_code: shortened.record.code.into(),
            short_url: shortened.short_url,
            original_url: shortened.record.original_url,
            expires_at: shortened.record.expires_at,
        }
    }
}
