use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-URL mutual exclusion for the check-then-insert sequence of `shorten`.
///
/// Entries are created on demand and removed when the last holder releases
/// them, so the table only ever contains URLs with a shorten in flight.
/// The exclusion is in-process only.
#[derive(Debug, Default)]
pub struct UrlLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds the lock for one URL until dropped.
#[derive(Debug)]
pub struct UrlLockGuard<'a> {
    locks: &'a UrlLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UrlLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds the lock for `url`.
    pub async fn lock(&self, url: &str) -> UrlLockGuard<'_> {
        let mutex = Arc::clone(self.locks.entry(url.to_owned()).or_default().value());
        let guard = mutex.lock_owned().await;

        UrlLockGuard {
            locks: self,
            key: url.to_owned(),
            guard: Some(guard),
        }
    }

    /// Number of URLs currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for UrlLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself still references the mutex: nobody is waiting.
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_removed_after_release() {
        let locks = UrlLocks::new();

        {
            let _guard = locks.lock("https://example.com").await;
            assert_eq!(locks.len(), 1);
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_url_is_exclusive() {
        let locks = Arc::new(UrlLocks::new());
        let guard = locks.lock("https://example.com").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("https://example.com").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_urls_do_not_block() {
        let locks = UrlLocks::new();

        let _first = locks.lock("https://one.example").await;
        let _second = locks.lock("https://two.example").await;

        assert_eq!(locks.len(), 2);
    }
}
