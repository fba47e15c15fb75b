//! Application assembly.
//!
//! Wires storage, cache and emitter backends into the entity services and
//! owns everything that has to be shut down: the per-service worker pools
//! and the notification sweeper.
//!
//! Backends are chosen by feature flag:
//!
//! | Concern | default | feature |
//! |---------|---------|---------|
//! | storage | in-memory | `sqlite` |
//! | cache   | in-process LRU | `redis` |
//! | events  | tracing log | `redis` |

use std::sync::Arc;

use fridgemate_core::cache::Cache;
use fridgemate_core::entities::{Budget, Notification, Product, Recipe, User};
use fridgemate_core::events::EventEmitter;
use fridgemate_core::record::Record;
use fridgemate_core::storage::Repository;
use fridgemate_core::token::TokenAuthority;

use crate::config::Config;
use crate::credentials::OpaqueTokenAuthority;
use crate::pool::PoolStats;
use crate::records::RecordStore;
use crate::services::{
    BudgetService, NotificationService, ProductService, RecipeService, Sweeper, UserService,
};
use crate::storage::InMemoryRepository;

/// One repository per record kind.
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub budgets: Arc<dyn Repository<Budget>>,
    pub products: Arc<dyn Repository<Product>>,
    pub recipes: Arc<dyn Repository<Recipe>>,
    pub notifications: Arc<dyn Repository<Notification>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::new()),
            budgets: Arc::new(InMemoryRepository::new()),
            products: Arc::new(InMemoryRepository::new()),
            recipes: Arc::new(InMemoryRepository::new()),
            notifications: Arc::new(InMemoryRepository::new()),
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite(db: &crate::storage::SqliteDatabase) -> Self {
        Self {
            users: Arc::new(db.repository()),
            budgets: Arc::new(db.repository()),
            products: Arc::new(db.repository()),
            recipes: Arc::new(db.repository()),
            notifications: Arc::new(db.repository()),
        }
    }
}

/// The running application: every entity service plus background tasks.
pub struct App {
    pub users: UserService,
    pub budgets: BudgetService,
    pub products: ProductService,
    pub recipes: RecipeService,
    pub notifications: Arc<NotificationService>,
    sweeper: Sweeper,
}

impl App {
    /// Builds the application on the backends selected at compile time.
    pub async fn build(config: &Config) -> Result<Self, anyhow::Error> {
        #[cfg(feature = "sqlite")]
        let repositories = {
            let db = crate::storage::SqliteDatabase::open(&config.sqlite_path).await?;
            tracing::info!(path = %config.sqlite_path, "Using SQLite storage");
            Repositories::sqlite(&db)
        };
        #[cfg(not(feature = "sqlite"))]
        let repositories = {
            tracing::info!("Using in-memory storage");
            Repositories::in_memory()
        };

        #[cfg(feature = "redis")]
        let (cache, emitter): (Arc<dyn Cache>, Arc<dyn EventEmitter>) = {
            let cache = crate::cache::RedisCache::new(&config.redis_url).await?;
            let emitter = crate::events::RedisEmitter::new(&config.redis_url).await?;
            tracing::info!(url = %config.redis_url, "Using Redis cache and events");
            (Arc::new(cache), Arc::new(emitter))
        };
        #[cfg(not(feature = "redis"))]
        let (cache, emitter): (Arc<dyn Cache>, Arc<dyn EventEmitter>) = {
            tracing::info!(
                max_entries = config.cache_max_entries,
                "Using in-memory cache"
            );
            (
                Arc::new(crate::cache::MemoryCache::new(config.cache_max_entries)),
                Arc::new(crate::events::LogEmitter),
            )
        };

        Self::new(config, repositories, cache, emitter)
    }

    /// Assembles the services on explicit backends. Must run inside a tokio runtime.
    pub fn new(
        config: &Config,
        repositories: Repositories,
        cache: Arc<dyn Cache>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<Self, anyhow::Error> {
        let pool = config.pool_config()?;
        let tokens: Arc<dyn TokenAuthority> = Arc::new(OpaqueTokenAuthority);
        let stores = StoreFactory {
            cache,
            emitter: Arc::clone(&emitter),
            config,
        };

        let notifications = Arc::new(NotificationService::new(
            stores.build(repositories.notifications),
            Arc::clone(&tokens),
            pool.clone(),
        ));
        let sweeper = Sweeper::spawn(
            Arc::clone(&notifications),
            config.notification_retention(),
        );

        tracing::info!(
            workers = pool.worker_count,
            max_pending = pool.max_pending,
            timeout_ms = pool.task_timeout_ms,
            cache_ttl_secs = config.cache_ttl_seconds,
            "Application ready"
        );

        Ok(Self {
            users: UserService::new(
                stores.build(repositories.users),
                Arc::clone(&tokens),
                pool.clone(),
            ),
            budgets: BudgetService::new(stores.build(repositories.budgets), emitter, pool.clone()),
            products: ProductService::new(
                stores.build(repositories.products),
                Arc::clone(&tokens),
                pool.clone(),
            ),
            recipes: RecipeService::new(stores.build(repositories.recipes), pool),
            notifications,
            sweeper,
        })
    }

    /// Worker pool statistics of every service.
    pub fn stats(&self) -> Vec<PoolStats> {
        vec![
            self.users.stats(),
            self.budgets.stats(),
            self.products.stats(),
            self.recipes.stats(),
            self.notifications.stats(),
        ]
    }

    /// Stops the sweeper and drains every worker pool.
    pub async fn shutdown(&self) {
        self.sweeper.stop().await;
        self.users.shutdown().await;
        self.budgets.shutdown().await;
        self.products.shutdown().await;
        self.recipes.shutdown().await;
        self.notifications.shutdown().await;
        tracing::info!("Application stopped");
    }
}

/// Shared cache and emitter handed to every record kind.
struct StoreFactory<'a> {
    cache: Arc<dyn Cache>,
    emitter: Arc<dyn EventEmitter>,
    config: &'a Config,
}

impl StoreFactory<'_> {
    fn build<R: Record>(&self, repository: Arc<dyn Repository<R>>) -> RecordStore<R> {
        RecordStore::new(
            repository,
            Arc::clone(&self.cache),
            self.config.cache_ttl(),
            Arc::clone(&self.emitter),
        )
    }
}
