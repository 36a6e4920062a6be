use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::repository::Result;
use snip_core::{Repository, ShortCode, StorageError, UrlRecord};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

/// Connection pool and deadline settings for [`MySqlRepository`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MySqlSettings {
    #[builder(setter(into))]
    pub dsn: String,
    /// Upper bound on open connections.
    #[builder(default = 25)]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[builder(default = 5)]
    pub min_connections: u32,
    #[builder(default = Duration::from_secs(5 * 60))]
    pub max_lifetime: Duration,
    #[builder(default = Duration::from_secs(60))]
    pub idle_timeout: Duration,
    /// How long to wait for a pooled connection, including the initial connect.
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
    /// Deadline applied to every repository call.
    #[builder(default = DEFAULT_OPERATION_TIMEOUT)]
    pub operation_timeout: Duration,
}

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// MySQL implementation of the repository contract.
///
/// The `short_code` primary key is the synchronisation primitive: `save`
/// issues an `INSERT` and, on a duplicate key, re-reads the row holding the
/// code to tell an idempotent re-save from a collision. No in-process
/// locking is involved.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
    operation_timeout: Duration,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Overrides the per-call deadline.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(settings: &MySqlSettings) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(settings.max_lifetime)
            .idle_timeout(settings.idle_timeout)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.dsn)
            .await
            .map_err(map_sqlx_error)?;

        info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "connected to mysql"
        );

        Ok(Self::new(pool).with_operation_timeout(settings.operation_timeout))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StorageError::Timeout(format!(
                "{operation} exceeded {:?}",
                self.operation_timeout
            ))),
        }
    }

    /// Reads the row holding `code`, expired or not.
    async fn fetch_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = self
            .bounded(
                "select by code",
                sqlx::query(
                    r#"
                    SELECT short_code, original_url, created_at, expires_at
                    FROM short_urls
                    WHERE short_code = ?
                    LIMIT 1
                    "#,
                )
                .bind(code.as_str())
                .fetch_optional(&self.pool),
            )
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Overwrites the row for `record.code` if it has expired.
    async fn reclaim_expired(&self, record: &UrlRecord) -> Result<bool> {
        let now = Timestamp::now().as_microsecond();

        let result = self
            .bounded(
                "reclaim expired code",
                sqlx::query(
                    r#"
                    UPDATE short_urls
                    SET original_url = ?, created_at = ?, expires_at = ?
                    WHERE short_code = ?
                      AND expires_at IS NOT NULL
                      AND expires_at < ?
                    "#,
                )
                .bind(record.original_url.as_str())
                .bind(record.created_at.as_microsecond())
                .bind(record.expires_at.map(|ts| ts.as_microsecond()))
                .bind(record.code.as_str())
                .bind(now)
                .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn record_from_row(row: &MySqlRow) -> Result<UrlRecord> {
    let code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;

    Ok(UrlRecord {
        code: ShortCode::new(code).map_err(|e| StorageError::InvalidData(e.to_string()))?,
        original_url,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: expires_at
            .map(|value| parse_timestamp("expires_at", value))
            .transpose()?,
    })
}

fn live(record: UrlRecord, key: &str) -> Result<UrlRecord> {
    if record.is_expired() {
        return Err(StorageError::Expired(key.to_string()));
    }
    Ok(record)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    if is_unique_violation(&err) {
        return StorageError::Conflict(message);
    }

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn save(&self, record: &UrlRecord) -> Result<()> {
        record.check_storable()?;

        // A plain INSERT: only a duplicate key becomes `Conflict`, every other
        // strict-mode failure (e.g. "Data too long") surfaces as an error.
        let inserted = self
            .bounded(
                "insert",
                sqlx::query(
                    r#"
                    INSERT INTO short_urls (short_code, original_url, created_at, expires_at)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(record.code.as_str())
                .bind(record.original_url.as_str())
                .bind(record.created_at.as_microsecond())
                .bind(record.expires_at.map(|ts| ts.as_microsecond()))
                .execute(&self.pool),
            )
            .await;

        match inserted {
            Ok(_) => {
                trace!(code = %record.code, "inserted record");
                return Ok(());
            }
            Err(StorageError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }

        // The code is taken. Find out by whom.
        let Some(existing) = self.fetch_by_code(&record.code).await? else {
            return Err(StorageError::Operation(format!(
                "insert of '{}' hit a duplicate key but no row holds the code",
                record.code
            )));
        };

        if !existing.is_expired() {
            if existing.original_url == record.original_url {
                return Ok(());
            }
            return Err(StorageError::Conflict(record.code.to_string()));
        }

        if self.reclaim_expired(record).await? {
            debug!(code = %record.code, stale_url = %existing.original_url, "reclaimed expired short code");
            return Ok(());
        }

        // Another writer reclaimed the slot first.
        match self.fetch_by_code(&record.code).await? {
            Some(current) if current.original_url == record.original_url => Ok(()),
            _ => Err(StorageError::Conflict(record.code.to_string())),
        }
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<UrlRecord> {
        trace!(code = %code, "fetching record by code");

        match self.fetch_by_code(code).await? {
            Some(record) => live(record, code.as_str()),
            None => Err(StorageError::NotFound(code.to_string())),
        }
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<UrlRecord> {
        let now = Timestamp::now().as_microsecond();

        // Several rows may share a URL; prefer a live one, then the newest.
        let row = self
            .bounded(
                "select by original url",
                sqlx::query(
                    r#"
                    SELECT short_code, original_url, created_at, expires_at
                    FROM short_urls
                    WHERE original_url = ?
                    ORDER BY (expires_at IS NULL OR expires_at >= ?) DESC, created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(original_url)
                .bind(now)
                .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => live(record_from_row(&row)?, original_url),
            None => Err(StorageError::NotFound(original_url.to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        info!("mysql pool closed");
        Ok(())
    }
}
