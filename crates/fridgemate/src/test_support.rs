//! Instrumented cache, repository and emitter doubles shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fridgemate_core::cache::{self, Cache, CacheError};
use fridgemate_core::events::EventEmitter;
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Record, RecordId};
use fridgemate_core::storage::{self, Repository, RepositoryError};

use crate::cache::MemoryCache;
use crate::pool::WorkerPool;
use crate::records::RecordStore;
use crate::services::PooledStore;
use crate::storage::InMemoryRepository;

/// Memory cache that counts calls and can be told to fail.
pub struct FlakyCache {
    inner: MemoryCache,
    failing: AtomicBool,
    /// Sets allowed to succeed before every further set fails.
    sets_before_failure: AtomicUsize,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(1000),
            failing: AtomicBool::new(false),
            sets_before_failure: AtomicUsize::new(usize::MAX),
            get_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_sets_after(&self, successes: usize) {
        self.sets_before_failure.store(successes, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.contains(key).await
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    fn check(&self) -> cache::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for FlakyCache {
    async fn get(&self, key: &str) -> cache::Result<Option<Vec<u8>>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> cache::Result<()> {
        let call = self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if call >= self.sets_before_failure.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionFailed("connection reset".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> cache::Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(key).await
    }
}

/// In-memory repository that counts reads and writes and can be told to fail.
pub struct CountingRepository<R: Record> {
    inner: InMemoryRepository<R>,
    failing: AtomicBool,
    /// Key reads report nothing, leaving constraint checks on save as the only guard.
    blind_key_reads: AtomicBool,
    read_calls: AtomicUsize,
    save_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    /// Delay applied to every save, to widen race windows.
    save_delay: Mutex<Option<Duration>>,
}

impl<R: Record> CountingRepository<R> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            failing: AtomicBool::new(false),
            blind_key_reads: AtomicBool::new(false),
            read_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            save_delay: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_blind_key_reads(&self, blind: bool) {
        self.blind_key_reads.store(blind, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    /// Number of single-record reads (`find_by_id`, `find_by`, `exists_by`).
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Direct access to the backing store, bypassing counters and failures.
    pub fn inner(&self) -> &InMemoryRepository<R> {
        &self.inner
    }

    fn check(&self) -> storage::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::StorageUnavailable(
                "database is down".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> Repository<R> for CountingRepository<R> {
    async fn find_by_id(&self, id: RecordId) -> storage::Result<Option<R>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_id(id).await
    }

    async fn find_by(&self, field: R::Field, value: &str) -> storage::Result<Option<R>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.blind_key_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by(field, value).await
    }

    async fn exists_by(&self, field: R::Field, value: &str) -> storage::Result<bool> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.blind_key_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.exists_by(field, value).await
    }

    async fn find_all_by(&self, field: R::Field, value: &str) -> storage::Result<Vec<R>> {
        self.check()?;
        self.inner.find_all_by(field, value).await
    }

    async fn find_all(&self) -> storage::Result<Vec<R>> {
        self.check()?;
        self.inner.find_all().await
    }

    async fn save(&self, record: &R) -> storage::Result<R> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.save(record).await
    }

    async fn delete_by_id(&self, id: RecordId) -> storage::Result<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete_by_id(id).await
    }

    async fn delete_by(&self, field: R::Field, value: &str) -> storage::Result<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete_by(field, value).await
    }

    async fn delete_many(&self, ids: &[RecordId]) -> storage::Result<u64> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete_many(ids).await
    }

    async fn delete_all(&self) -> storage::Result<u64> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete_all().await
    }
}

/// Emitter that keeps every published message.
#[derive(Default)]
pub struct RecordingEmitter {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingEmitter {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn publish(&self, topic: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), message.to_string()));
    }
}

/// Shared handles for wiring an engine in tests.
pub struct Fixture<R: Record> {
    pub repository: Arc<CountingRepository<R>>,
    pub cache: Arc<FlakyCache>,
    pub emitter: Arc<RecordingEmitter>,
}

impl<R: Record> Fixture<R> {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(CountingRepository::new()),
            cache: Arc::new(FlakyCache::new()),
            emitter: Arc::new(RecordingEmitter::default()),
        }
    }

    pub fn store(&self) -> RecordStore<R> {
        RecordStore::new(
            self.repository.clone(),
            self.cache.clone(),
            Duration::from_secs(60),
            self.emitter.clone(),
        )
    }

    /// A store running on a small private pool.
    pub fn pooled(&self, name: &'static str) -> PooledStore<R> {
        let config = PoolConfig::with_defaults(2).unwrap();
        PooledStore::new(self.store(), WorkerPool::new(name, config))
    }
}
