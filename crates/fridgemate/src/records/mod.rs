//! Generic multi-index cache engine shared by every record kind.
//!
//! - [`MultiIndexCache`]: one snapshot per unique key, uniform TTL
//! - [`LookupService`]: read-through path
//! - [`Coordinator`]: create/update/delete keeping cache and storage coherent

mod coordinator;
mod index;
mod lookup;

use std::sync::Arc;
use std::time::Duration;

use fridgemate_core::cache::Cache;
use fridgemate_core::events::EventEmitter;
use fridgemate_core::record::Record;
use fridgemate_core::storage::Repository;

pub use coordinator::Coordinator;
pub use index::MultiIndexCache;
pub use lookup::LookupService;

/// The read and write paths for one record kind, wired to the same backends.
pub struct RecordStore<R: Record> {
    pub lookup: LookupService<R>,
    pub coordinator: Coordinator<R>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(
        repository: Arc<dyn Repository<R>>,
        cache: Arc<dyn Cache>,
        ttl: Duration,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let index = MultiIndexCache::new(cache, ttl);
        Self {
            lookup: LookupService::new(Arc::clone(&repository), index.clone()),
            coordinator: Coordinator::new(repository, index, emitter),
        }
    }
}

impl<R: Record> Clone for RecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            lookup: self.lookup.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}
