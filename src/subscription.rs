//! Live subscription handles onto cached query entries.

use std::fmt;

use tokio::sync::watch;
use uuid::Uuid;

use crate::entry::{QuerySnapshot, QueryStatus};
use crate::key::CacheKey;
use crate::store::ResourceCache;

/// Refcounted handle onto one cache entry.
///
/// Holding the handle keeps the entry alive. Dropping it (or calling
/// [`QuerySubscription::unsubscribe`]) releases the reference; once an entry
/// has no subscribers left its disposal timer starts.
pub struct QuerySubscription {
    cache: ResourceCache,
    key: CacheKey,
    id: Uuid,
    rx: watch::Receiver<QuerySnapshot>,
    released: bool,
}

impl QuerySubscription {
    pub(crate) fn new(
        cache: ResourceCache,
        key: CacheKey,
        id: Uuid,
        rx: watch::Receiver<QuerySnapshot>,
    ) -> Self {
        Self {
            cache,
            key,
            id,
            rx,
            released: false,
        }
    }

    /// Cache key this subscription is attached to.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Current snapshot of the entry.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.rx.borrow().clone()
    }

    /// Decodes the current data payload, if any.
    pub fn data_as<T>(&self) -> Result<Option<T>, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        self.snapshot().data_as()
    }

    /// Waits for the next snapshot change.
    ///
    /// Returns the last observed snapshot if the entry was evicted while
    /// waiting.
    pub async fn changed(&mut self) -> QuerySnapshot {
        if self.rx.changed().await.is_err() {
            return self.snapshot();
        }
        self.snapshot()
    }

    /// Waits until the entry settles into a fulfilled or rejected state.
    pub async fn settled(&mut self) -> QuerySnapshot {
        loop {
            let snapshot = self.snapshot();
            if matches!(
                snapshot.status,
                QueryStatus::Fulfilled | QueryStatus::Rejected
            ) {
                return snapshot;
            }
            if self.rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Forces a refetch of this entry, superseding any in-flight request.
    pub fn refetch(&self) {
        self.cache.refetch_key(&self.key, "manual");
    }

    /// Releases the subscription explicitly instead of on drop.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if !self.released {
            self.released = true;
            self.cache.release(&self.key, self.id);
        }
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for QuerySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.key.to_string())
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
