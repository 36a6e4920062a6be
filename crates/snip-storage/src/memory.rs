use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use snip_core::repository::Result;
use snip_core::{Repository, ShortCode, StorageError, UrlRecord};
use std::collections::HashMap;
use tracing::trace;

/// Both indices live behind the same lock and are always mutated together.
#[derive(Debug, Default)]
struct Indexes {
    by_code: HashMap<ShortCode, UrlRecord>,
    by_original_url: HashMap<String, ShortCode>,
}

/// In-memory implementation of the [`Repository`] trait.
///
/// A write holds the exclusive lock for the whole check-then-insert sequence,
/// which is the entire atomicity guarantee of this backend. Reads take the
/// shared lock.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    indexes: RwLock<Indexes>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.indexes.read().by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn live(record: &UrlRecord, key: &str) -> Result<UrlRecord> {
    if record.is_expired_at(Timestamp::now()) {
        return Err(StorageError::Expired(key.to_string()));
    }
    Ok(record.clone())
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn save(&self, record: &UrlRecord) -> Result<()> {
        record.check_storable()?;

        let mut guard = self.indexes.write();
        let indexes = &mut *guard;

        if let Some(existing) = indexes.by_code.get(&record.code) {
            if !existing.is_expired() {
                if existing.original_url == record.original_url {
                    return Ok(());
                }
                return Err(StorageError::Conflict(record.code.to_string()));
            }

            // Expired holder: reclaim the slot and drop its URL index entry.
            let stale_url = existing.original_url.clone();
            trace!(code = %record.code, stale_url = %stale_url, "reclaiming expired short code");
            if indexes.by_original_url.get(&stale_url) == Some(&record.code) {
                indexes.by_original_url.remove(&stale_url);
            }
        }

        indexes
            .by_original_url
            .insert(record.original_url.clone(), record.code.clone());
        indexes.by_code.insert(record.code.clone(), record.clone());
        Ok(())
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<UrlRecord> {
        let indexes = self.indexes.read();

        let Some(record) = indexes.by_code.get(code.as_str()) else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        live(record, code.as_str())
    }

    async fn get_by_original_url(&self, original_url: &str) -> Result<UrlRecord> {
        let indexes = self.indexes.read();

        let record = indexes
            .by_original_url
            .get(original_url)
            .and_then(|code| indexes.by_code.get(code));

        let Some(record) = record else {
            return Err(StorageError::NotFound(original_url.to_string()));
        };

        live(record, original_url)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
