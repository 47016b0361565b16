//! In-memory stock store.

use flashsale_core::{ProductId, StockStore, StockStoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy)]
struct Counters {
    available: i32,
    reserved: i32,
}

/// In-memory [`StockStore`] with the same atomic contract as the Redis
/// implementation: every check-then-mutate pair runs under one mutex, so
/// concurrent callers interleave only between whole operations, exactly
/// the guarantee the server-side scripts give.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockStore {
    counters: Arc<Mutex<HashMap<i64, Counters>>>,
}

impl InMemoryStockStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the raw counter pair (for assertions).
    #[must_use]
    pub fn counters(&self, product_id: ProductId) -> Option<(i32, i32)> {
        self.lock()
            .get(&product_id.value())
            .map(|c| (c.available, c.reserved))
    }

    /// Drops every counter pair (simulates a cache flush / full expiry).
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Counters>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StockStore for InMemoryStockStore {
    async fn init_stock(
        &self,
        product_id: ProductId,
        available: i32,
        reserved: i32,
    ) -> Result<(), StockStoreError> {
        self.lock().insert(
            product_id.value(),
            Counters {
                available,
                reserved,
            },
        );
        Ok(())
    }

    async fn get_available(&self, product_id: ProductId) -> Result<i32, StockStoreError> {
        self.lock()
            .get(&product_id.value())
            .map(|c| c.available)
            .ok_or(StockStoreError::NotFound {
                product_id: product_id.value(),
            })
    }

    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, StockStoreError> {
        let mut counters = self.lock();
        let Some(pair) = counters.get_mut(&product_id.value()) else {
            return Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            });
        };
        if pair.available < quantity {
            return Ok(false);
        }
        pair.available -= quantity;
        pair.reserved += quantity;
        Ok(true)
    }

    async fn confirm_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), StockStoreError> {
        let mut counters = self.lock();
        let Some(pair) = counters.get_mut(&product_id.value()) else {
            return Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            });
        };
        if pair.reserved < quantity {
            return Err(StockStoreError::InsufficientReserved {
                product_id: product_id.value(),
            });
        }
        pair.reserved -= quantity;
        Ok(())
    }

    async fn cancel_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), StockStoreError> {
        let mut counters = self.lock();
        let Some(pair) = counters.get_mut(&product_id.value()) else {
            return Err(StockStoreError::NotFound {
                product_id: product_id.value(),
            });
        };
        if pair.reserved < quantity {
            return Err(StockStoreError::InsufficientReserved {
                product_id: product_id.value(),
            });
        }
        pair.available += quantity;
        pair.reserved -= quantity;
        Ok(())
    }

    async fn delete_stock(&self, product_id: ProductId) -> Result<(), StockStoreError> {
        self.lock().remove(&product_id.value());
        Ok(())
    }

    async fn refresh_ttl(&self, _product_id: ProductId) -> Result<(), StockStoreError> {
        // No TTL to refresh in memory.
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_declines_without_mutating() {
        let store = InMemoryStockStore::new();
        let product = ProductId::new(1);
        store.init_stock(product, 3, 0).await.unwrap();

        assert!(!store.reserve(product, 5).await.unwrap());
        assert_eq!(store.counters(product), Some((3, 0)));

        assert!(store.reserve(product, 3).await.unwrap());
        assert_eq!(store.counters(product), Some((0, 3)));
    }

    #[tokio::test]
    async fn missing_counters_are_not_zero_stock() {
        let store = InMemoryStockStore::new();
        let product = ProductId::new(404);
        assert!(matches!(
            store.get_available(product).await,
            Err(StockStoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.reserve(product, 1).await,
            Err(StockStoreError::NotFound { .. })
        ));
    }
}
