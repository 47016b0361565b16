//! Resource management for infrastructure setup.
//!
//! Centralizes infrastructure initialization (database pool, migrations,
//! Redis stores, ID generator) into a single [`ResourceManager`] that the
//! binaries wire handlers from.

use crate::config::Config;
use flashsale_core::{IdGenerator, SystemClock};
use flashsale_postgres::PostgresProductRepository;
use flashsale_redis::{RedisLockManager, RedisStockStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Central owner of all infrastructure components.
///
/// # Thread Safety
///
/// Every resource is either `Clone` over a shared connection manager or
/// wrapped in `Arc`, so the manager can be cloned into any task.
#[derive(Clone)]
pub struct ResourceManager {
    /// Application configuration
    pub config: Arc<Config>,

    /// System clock for timestamps
    pub clock: Arc<SystemClock>,

    /// Durable store pool
    pub pool: Arc<PgPool>,

    /// Product repository over the durable store
    pub repository: PostgresProductRepository,

    /// Atomic stock counters in the shared fast store
    pub stock_store: RedisStockStore,

    /// Per-resource leases in the shared fast store
    pub lock_manager: RedisLockManager,

    /// Unique-ID allocator for this node
    pub id_generator: Arc<IdGenerator>,
}

impl ResourceManager {
    /// Initialize all infrastructure resources from configuration.
    ///
    /// Connects the `PostgreSQL` pool, runs migrations, connects both
    /// Redis stores, and builds the ID generator for this node.
    ///
    /// # Errors
    ///
    /// Returns an error if any connection, the migration run, or the
    /// generator construction fails.
    pub async fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to products database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.postgres.max_connections)
            .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
            .connect(&config.postgres.url)
            .await?;

        info!("Running product migrations...");
        flashsale_postgres::MIGRATOR.run(&pool).await?;
        info!("Product migrations complete");

        let pool = Arc::new(pool);
        let repository = PostgresProductRepository::new(Arc::clone(&pool));

        info!("Connecting to Redis...");
        let stock_store = RedisStockStore::new(&config.redis.url)
            .await?
            .with_ttl(Duration::from_secs(config.redis.stock_ttl));
        let lock_manager = RedisLockManager::new(&config.redis.url).await?;
        info!("Redis stores connected");

        let clock = Arc::new(SystemClock);
        let id_generator = Arc::new(IdGenerator::new(config.idgen.node_id, clock.clone())?);
        info!(node_id = config.idgen.node_id, "ID generator ready");

        Ok(Self {
            config: Arc::new(config.clone()),
            clock,
            pool,
            repository,
            stock_store,
            lock_manager,
            id_generator,
        })
    }
}
