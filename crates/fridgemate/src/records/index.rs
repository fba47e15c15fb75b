//! One cache entry per unique key of a record.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use fridgemate_core::cache::{
    cache_key, deserialize_record, serialize_record, Cache, CacheError, Result,
};
use fridgemate_core::record::{Field, Record};

/// Snapshot cache addressing each record by every one of its unique keys.
///
/// `put` writes one entry per key with the same TTL. The writes are not
/// atomic: a failure partway leaves some keys fresh and others stale until
/// they expire.
pub struct MultiIndexCache<R> {
    cache: Arc<dyn Cache>,
    ttl: Duration,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for MultiIndexCache<R> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            _record: PhantomData,
        }
    }
}

impl<R: Record> MultiIndexCache<R> {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            _record: PhantomData,
        }
    }

    /// Returns the cached snapshot for `field = value`.
    ///
    /// Backend failures and undecodable snapshots count as a miss.
    pub async fn get(&self, field: R::Field, value: &str) -> Option<R> {
        let key = cache_key(R::KIND, field.name(), value);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match deserialize_record::<R>(&bytes) {
                Ok(record) => {
                    tracing::trace!(kind = R::KIND, key = %key, "Cache hit");
                    Some(record)
                }
                Err(err) => {
                    tracing::warn!(kind = R::KIND, key = %key, error = %err, "Cache snapshot deserialization failed");
                    None
                }
            },
            Ok(None) => {
                tracing::trace!(kind = R::KIND, key = %key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(kind = R::KIND, key = %key, error = %err, "Cache read failed, falling back to storage");
                None
            }
        }
    }

    /// Writes the snapshot under every unique key of `record`.
    ///
    /// Every key is attempted; the first failure is returned.
    pub async fn put(&self, record: &R) -> Result<()> {
        let bytes =
            serialize_record(record).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut first_error = None;
        for (field, value) in record.keys() {
            let key = cache_key(R::KIND, field.name(), &value);
            if let Err(err) = self.cache.set(&key, &bytes, Some(self.ttl)).await {
                tracing::warn!(kind = R::KIND, key = %key, error = %err, "Failed to cache record");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Removes the entries for the given keys.
    ///
    /// Every key is attempted; the first failure is returned.
    pub async fn evict(&self, keys: &[(R::Field, String)]) -> Result<()> {
        let mut first_error = None;
        for (field, value) in keys {
            let key = cache_key(R::KIND, field.name(), value);
            if let Err(err) = self.cache.delete(&key).await {
                tracing::warn!(kind = R::KIND, key = %key, error = %err, "Failed to evict cache entry");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Removes every entry addressed by any key of `record`.
    pub async fn evict_all(&self, record: &R) -> Result<()> {
        self.evict(&record.keys()).await
    }
}
