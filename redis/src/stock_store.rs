//! Redis-backed atomic stock store.
//!
//! Keeps two counters per product:
//!
//! - `stock:product:{id}:available`
//! - `stock:product:{id}:reserved`
//!
//! # Atomicity
//!
//! Reserve, confirm, and cancel each run as a single Lua script, so the
//! check and the mutation cannot interleave with another client. This is
//! the entire defense against overselling: the operations are never
//! implemented as a GET, a local decision, and a write.
//!
//! # Missing counters
//!
//! The scripts distinguish "counter pair absent" (`-1`) from "insufficient
//! stock" (`0`). A missing pair maps to [`StockStoreError::NotFound`] so
//! callers fall back to the durable store instead of declining a purchase
//! on a cold cache.
//!
//! # TTL
//!
//! Counters carry a refreshable TTL (default 24 hours) so stale products
//! age out of the cache; the reconciliation job re-seeds live ones.

use flashsale_core::{ProductId, StockStore, StockStoreError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Default TTL for the counter pair.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Atomically moves units from available to reserved if enough are
/// available. Returns -1 when the pair is missing, 0 on insufficient
/// stock, 1 on success.
const RESERVE_SCRIPT: &str = r"
    local available = redis.call('GET', KEYS[1])
    if not available then
        return -1
    end
    local quantity = tonumber(ARGV[1])
    if tonumber(available) < quantity then
        return 0
    end
    redis.call('DECRBY', KEYS[1], quantity)
    redis.call('INCRBY', KEYS[2], quantity)
    return 1
";

/// Atomically settles reserved units. Returns -1 when the pair is missing,
/// 0 on insufficient reserved units, 1 on success.
const CONFIRM_SCRIPT: &str = r"
    local reserved = redis.call('GET', KEYS[1])
    if not reserved then
        return -1
    end
    local quantity = tonumber(ARGV[1])
    if tonumber(reserved) < quantity then
        return 0
    end
    redis.call('DECRBY', KEYS[1], quantity)
    return 1
";

/// Atomically returns reserved units to the available pool. Returns -1
/// when the pair is missing, 0 on insufficient reserved units, 1 on
/// success.
const CANCEL_SCRIPT: &str = r"
    local reserved = redis.call('GET', KEYS[2])
    if not reserved then
        return -1
    end
    local quantity = tonumber(ARGV[1])
    if tonumber(reserved) < quantity then
        return 0
    end
    redis.call('INCRBY', KEYS[1], quantity)
    redis.call('DECRBY', KEYS[2], quantity)
    return 1
";

/// `Redis`-backed [`StockStore`].
///
/// # Thread Safety
///
/// This type is `Clone` and can be shared freely; each clone shares the
/// same [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisStockStore {
    conn_manager: ConnectionManager,
    ttl: Duration,
}

impl RedisStockStore {
    /// Connects a new stock store.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::Unavailable`] if the URL is malformed or
    /// the connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self, StockStoreError> {
        let client = Client::open(redis_url).map_err(|e| StockStoreError::Unavailable {
            message: format!("failed to create Redis client: {e}"),
        })?;

        let conn_manager =
            ConnectionManager::new(client)
                .await
                .map_err(|e| StockStoreError::Unavailable {
                    message: format!("failed to create Redis connection manager: {e}"),
                })?;

        tracing::info!("RedisStockStore initialized");

        Ok(Self {
            conn_manager,
            ttl: DEFAULT_TTL,
        })
    }

    /// Overrides the counter TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn available_key(product_id: ProductId) -> String {
        format!("stock:product:{product_id}:available")
    }

    fn reserved_key(product_id: ProductId) -> String {
        format!("stock:product:{product_id}:reserved")
    }

    fn store_error(operation: &str, error: &redis::RedisError) -> StockStoreError {
        StockStoreError::Unavailable {
            message: format!("{operation} failed: {error}"),
        }
    }

    /// Maps a script result to the shared outcome convention.
    fn map_script_result(
        product_id: ProductId,
        result: i64,
        on_insufficient: StockStoreError,
    ) -> Result<(), StockStoreError> {
        match result {
            1 => Ok(()),
            -1 => Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            }),
            _ => Err(on_insufficient),
        }
    }
}

impl StockStore for RedisStockStore {
    async fn init_stock(
        &self,
        product_id: ProductId,
        available: i32,
        reserved: i32,
    ) -> Result<(), StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let _: () = redis::pipe()
            .set_ex(
                Self::available_key(product_id),
                available,
                self.ttl.as_secs(),
            )
            .ignore()
            .set_ex(Self::reserved_key(product_id), reserved, self.ttl.as_secs())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("init stock", &e))?;

        tracing::debug!(
            product_id = %product_id,
            available,
            reserved,
            "seeded stock counters"
        );

        Ok(())
    }

    async fn get_available(&self, product_id: ProductId) -> Result<i32, StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let value: Option<String> = conn
            .get(Self::available_key(product_id))
            .await
            .map_err(|e| Self::store_error("get available", &e))?;

        let Some(raw) = value else {
            return Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            });
        };

        raw.parse::<i32>().map_err(|e| StockStoreError::Corrupt {
            message: format!("available counter for product {product_id}: {e}"),
        })
    }

    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let result: i64 = redis::Script::new(RESERVE_SCRIPT)
            .key(Self::available_key(product_id))
            .key(Self::reserved_key(product_id))
            .arg(quantity)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("reserve", &e))?;

        match result {
            1 => {
                tracing::debug!(product_id = %product_id, quantity, "reserved stock");
                Ok(true)
            }
            -1 => Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            }),
            _ => {
                // Expected outcome under a sell-out, not an error.
                tracing::debug!(product_id = %product_id, quantity, "reserve declined");
                Ok(false)
            }
        }
    }

    async fn confirm_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let result: i64 = redis::Script::new(CONFIRM_SCRIPT)
            .key(Self::reserved_key(product_id))
            .arg(quantity)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("confirm reservation", &e))?;

        Self::map_script_result(
            product_id,
            result,
            StockStoreError::InsufficientReserved {
                product_id: product_id.value(),
            },
        )?;

        tracing::debug!(product_id = %product_id, quantity, "confirmed reservation");
        Ok(())
    }

    async fn cancel_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let result: i64 = redis::Script::new(CANCEL_SCRIPT)
            .key(Self::available_key(product_id))
            .key(Self::reserved_key(product_id))
            .arg(quantity)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("cancel reservation", &e))?;

        Self::map_script_result(
            product_id,
            result,
            StockStoreError::InsufficientReserved {
                product_id: product_id.value(),
            },
        )?;

        tracing::debug!(product_id = %product_id, quantity, "cancelled reservation");
        Ok(())
    }

    async fn delete_stock(&self, product_id: ProductId) -> Result<(), StockStoreError> {
        let mut conn = self.conn_manager.clone();

        let _: () = redis::pipe()
            .del(Self::available_key(product_id))
            .ignore()
            .del(Self::reserved_key(product_id))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("delete stock", &e))?;

        Ok(())
    }

    async fn refresh_ttl(&self, product_id: ProductId) -> Result<(), StockStoreError> {
        let mut conn = self.conn_manager.clone();

        #[allow(clippy::cast_possible_wrap)] // TTLs are far below i64::MAX seconds
        let ttl_seconds = self.ttl.as_secs() as i64;

        let _: () = redis::pipe()
            .expire(Self::available_key(product_id), ttl_seconds)
            .ignore()
            .expire(Self::reserved_key(product_id), ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::store_error("refresh ttl", &e))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn connect() -> RedisStockStore {
        RedisStockStore::new("redis://127.0.0.1:6379")
            .await
            .expect("failed to connect to Redis")
    }

    #[tokio::test]
    #[ignore] // Requires Redis running at localhost:6379
    async fn stock_lifecycle() {
        let store = connect().await;
        let product = ProductId::new(910_001);

        store.init_stock(product, 10, 0).await.unwrap();
        assert_eq!(store.get_available(product).await.unwrap(), 10);

        assert!(store.reserve(product, 4).await.unwrap());
        assert_eq!(store.get_available(product).await.unwrap(), 6);

        store.confirm_reservation(product, 2).await.unwrap();
        store.cancel_reservation(product, 2).await.unwrap();
        assert_eq!(store.get_available(product).await.unwrap(), 8);

        store.refresh_ttl(product).await.unwrap();
        assert_eq!(store.get_available(product).await.unwrap(), 8);

        store.delete_stock(product).await.unwrap();
        assert!(matches!(
            store.get_available(product).await,
            Err(StockStoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    #[ignore] // Requires Redis running at localhost:6379
    async fn reserve_declines_without_mutating() {
        let store = connect().await;
        let product = ProductId::new(910_002);

        store.init_stock(product, 3, 0).await.unwrap();
        assert!(!store.reserve(product, 5).await.unwrap());
        assert_eq!(store.get_available(product).await.unwrap(), 3);

        store.delete_stock(product).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis running at localhost:6379
    async fn missing_counters_are_not_zero_stock() {
        let store = connect().await;
        let product = ProductId::new(910_003);
        store.delete_stock(product).await.unwrap();

        assert!(matches!(
            store.reserve(product, 1).await,
            Err(StockStoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.confirm_reservation(product, 1).await,
            Err(StockStoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.cancel_reservation(product, 1).await,
            Err(StockStoreError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[ignore] // Requires Redis running at localhost:6379
    async fn concurrent_reserves_never_oversell() {
        let store = connect().await;
        let product = ProductId::new(910_004);
        let stock = 5;
        let attempts = 100;

        store.init_stock(product, stock, 0).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..attempts {
            let store = store.clone();
            handles.push(tokio::spawn(
                async move { store.reserve(product, 1).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, stock, "exactly the available units sell");
        assert_eq!(store.get_available(product).await.unwrap(), 0);

        store.delete_stock(product).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis running at localhost:6379
    async fn over_confirm_is_rejected() {
        let store = connect().await;
        let product = ProductId::new(910_005);

        store.init_stock(product, 10, 0).await.unwrap();
        assert!(store.reserve(product, 2).await.unwrap());
        assert!(matches!(
            store.confirm_reservation(product, 3).await,
            Err(StockStoreError::InsufficientReserved { .. })
        ));

        store.delete_stock(product).await.unwrap();
    }
}
