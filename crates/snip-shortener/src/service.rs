use crate::lock::UrlLocks;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use snip_core::{
    shortcode, ExpirationPolicy, Repository, ShortCode, ShortenParams, Shortened, Shortener,
    ShortenerError, StorageError, UrlRecord, MAX_URL_LENGTH,
};
use snip_generator::Generator;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// Number of generation attempts before a shorten gives up on collisions.
pub const MAX_ATTEMPTS: u32 = 10;

/// Settings supplied to the service at construction.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct ShortenerConfig {
    /// Prefix used to compose the full short link from a bare code.
    #[builder(default, setter(into))]
    pub base_url: String,
    /// TTL applied to new records when the request carries no expiration.
    /// Zero means records never expire.
    #[builder(default)]
    pub default_ttl: Duration,
}

/// Get-or-create coordinator over a [`Repository`] and a [`Generator`].
///
/// Each `shorten` call first looks the URL up and, failing that, walks
/// attempts `0..MAX_ATTEMPTS` of the generator until a save succeeds. A
/// conflict moves on to the next attempt with no delay; any other storage
/// error aborts the call.
///
/// Concurrent shortens of the same URL are serialised by a per-URL lock held
/// across the lookup and the insert, so within one process a URL gets at
/// most one live record. Processes sharing a database do not see each other's
/// locks and may still race to create two codes for one URL.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: R,
    generator: G,
    config: ShortenerConfig,
    locks: UrlLocks,
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G, config: ShortenerConfig) -> Self {
        Self {
            repository,
            generator,
            config,
            locks: UrlLocks::new(),
        }
    }

    /// Returns a reference to the repository, e.g. to close it at shutdown.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Checks that the URL is non-empty, parses as written, and is absolute
    /// `http(s)` with a host.
    ///
    /// The parser silently strips tabs and newlines, trims surrounding spaces
    /// and inserts a missing `//`. The raw string is what gets stored, so any
    /// input the parser would have to repair is refused.
    fn validate_url(raw: &str) -> Result<(), ShortenerError> {
        if raw.is_empty() {
            return Err(ShortenerError::EmptyUrl);
        }

        if raw.chars().any(char::is_control) {
            return Err(ShortenerError::InvalidUrl(
                "URL must not contain control characters".to_string(),
            ));
        }

        if raw.trim() != raw {
            return Err(ShortenerError::InvalidUrl(
                "URL must not have surrounding whitespace".to_string(),
            ));
        }

        let length = raw.chars().count();
        if length > MAX_URL_LENGTH {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL is {length} characters, limit is {MAX_URL_LENGTH}"
            )));
        }

        let parsed = Url::parse(raw)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{raw}: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }

        // `http:example.com` parses as `http://example.com/`
        if !raw[parsed.scheme().len()..].starts_with("://") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have an authority: {raw}"
            )));
        }

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {raw}"
            ))),
        }
    }

    /// Converts the requested policy, or the default TTL, to an expiration timestamp.
    fn expires_at(
        &self,
        policy: Option<&ExpirationPolicy>,
        now: Timestamp,
    ) -> Result<Option<Timestamp>, ShortenerError> {
        let after = |ttl: Duration| -> Result<Option<Timestamp>, ShortenerError> {
            if ttl.is_zero() {
                return Ok(None);
            }
            let ttl = SignedDuration::try_from(ttl)
                .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))?;
            now.checked_add(ttl)
                .map(|at| Some(truncate_to_micros(at)))
                .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))
        };

        match policy {
            None => after(self.config.default_ttl),
            Some(ExpirationPolicy::Never) => Ok(None),
            Some(ExpirationPolicy::AfterDuration(ttl)) => after(*ttl),
            Some(ExpirationPolicy::AtTimestamp(at)) => {
                if *at <= now {
                    return Err(ShortenerError::InvalidExpiration(format!(
                        "{at} is not in the future"
                    )));
                }
                Ok(Some(truncate_to_micros(*at)))
            }
        }
    }

    /// Current time at the microsecond precision every backend keeps.
    fn now() -> Timestamp {
        truncate_to_micros(Timestamp::now())
    }

    fn shortened(&self, record: UrlRecord, created: bool) -> Shortened {
        Shortened {
            short_url: record.code.to_url(&self.config.base_url),
            record,
            created,
        }
    }
}

fn truncate_to_micros(ts: Timestamp) -> Timestamp {
    Timestamp::from_microsecond(ts.as_microsecond()).unwrap_or(ts)
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<Shortened, ShortenerError> {
        Self::validate_url(&params.original_url)?;

        let _guard = self.locks.lock(&params.original_url).await;

        match self
            .repository
            .get_by_original_url(&params.original_url)
            .await
        {
            Ok(existing) => {
                debug!(code = %existing.code, "URL already shortened");
                return Ok(self.shortened(existing, false));
            }
            Err(e) if e.is_absent() => {}
            Err(e) => return Err(e.into()),
        }

        for attempt in 0..MAX_ATTEMPTS {
            let now = Self::now();
            let record = UrlRecord {
                code: self.generator.generate(&params.original_url, attempt),
                original_url: params.original_url.clone(),
                created_at: now,
                expires_at: self.expires_at(params.expiration.as_ref(), now)?,
            };

            match self.repository.save(&record).await {
                Ok(()) => {
                    debug!(code = %record.code, attempt, "created short code");
                    return Ok(self.shortened(record, true));
                }
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %record.code, attempt, "short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            url = %params.original_url,
            attempts = MAX_ATTEMPTS,
            "exhausted collision attempts"
        );
        Err(ShortenerError::TooManyCollisions {
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn resolve(&self, code: &str) -> Result<UrlRecord, ShortenerError> {
        // Malformed codes are reported exactly like missing ones.
        if !shortcode::is_valid(code) {
            trace!(code, "rejecting malformed short code");
            return Err(ShortenerError::NotFound);
        }

        let code = ShortCode::new_unchecked(code);
        match self.repository.get_by_code(&code).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_absent() => {
                trace!(code = %code, error = %e, "short code not resolvable");
                Err(ShortenerError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }
}
