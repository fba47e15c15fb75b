//! Read path: cache, then storage, then repopulate.

use std::sync::Arc;

use fridgemate_core::record::{Field, Record, RecordId};
use fridgemate_core::storage::{Repository, Result};

use super::MultiIndexCache;

/// Read-through lookups of a single record kind.
pub struct LookupService<R: Record> {
    repository: Arc<dyn Repository<R>>,
    index: MultiIndexCache<R>,
}

impl<R: Record> Clone for LookupService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            index: self.index.clone(),
        }
    }
}

impl<R: Record> LookupService<R> {
    pub fn new(repository: Arc<dyn Repository<R>>, index: MultiIndexCache<R>) -> Self {
        Self { repository, index }
    }

    /// Resolves a record by any unique key.
    ///
    /// A cache hit is returned as is. On a miss the record is read from
    /// storage and, when found, cached under all of its keys. A storage miss
    /// returns `None` and leaves the cache untouched.
    pub async fn lookup(&self, field: R::Field, value: &str) -> Result<Option<R>> {
        if let Some(record) = self.index.get(field, value).await {
            return Ok(Some(record));
        }

        let record = if field == R::ID {
            match value.parse::<RecordId>() {
                Ok(id) => self.repository.find_by_id(id).await?,
                Err(_) => None,
            }
        } else {
            self.repository.find_by(field, value).await?
        };

        if let Some(ref r) = record {
            tracing::debug!(kind = R::KIND, field = field.name(), id = %r.id(), "Repopulating cache from storage");
            // Cache write failures are logged by the index; the read still succeeds.
            let _ = self.index.put(r).await;
        }

        Ok(record)
    }

    /// Every record of this kind, straight from storage.
    pub async fn list_all(&self) -> Result<Vec<R>> {
        self.repository.find_all().await
    }

    /// Every record with `field = value`, straight from storage.
    pub async fn list_by(&self, field: R::Field, value: &str) -> Result<Vec<R>> {
        self.repository.find_all_by(field, value).await
    }
}
