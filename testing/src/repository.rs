//! In-memory product repository with failure injection.

use flashsale_core::{Product, ProductId, ProductRepository, RepositoryError, StockLedger};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory [`ProductRepository`].
///
/// `set_fail_writes(true)` makes the next writes fail with a database
/// error: the hook used to exercise the compensation path of the purchase
/// flow (reserve in cache succeeds, durable write fails, cache must be
/// released).
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<Mutex<BTreeMap<i64, Product>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryProductRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail (or succeed again) with a database
    /// error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored products (for assertions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, Product>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database {
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.lock()
            .get(&id.value())
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| products.get(&id.value()).cloned())
            .collect())
    }

    async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.lock().contains_key(&id.value()))
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.lock().insert(product.id().value(), product.clone());
        Ok(())
    }

    async fn update_stock(
        &self,
        id: ProductId,
        stock: StockLedger,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut products = self.lock();
        let product = products
            .get_mut(&id.value())
            .ok_or(RepositoryError::NotFound)?;
        let now = product.updated_at();
        product.set_stock(stock, now);
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.lock()
            .remove(&id.value())
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_ids(&self) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self.lock().keys().map(|&id| ProductId::new(id)).collect())
    }
}
