//! Read a product with live availability.

use crate::commands::seed_cache_best_effort;
use crate::error::Result;
use flashsale_core::{Product, ProductId, ProductRepository, ProductStatus, StockStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read model for one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    /// Product identifier.
    pub id: ProductId,
    /// Stock-keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Sale status.
    pub status: ProductStatus,
    /// Units available right now (cache-fresh when the cache is warm).
    pub available: i32,
    /// Units held for pending orders.
    pub reserved: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Handles product reads: the durable row plus the live availability
/// counter, falling back to the durable ledger (and re-seeding the cache)
/// on a miss or outage.
pub struct GetProductHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> GetProductHandler<R, S>
where
    R: ProductRepository,
    S: StockStore,
{
    /// Creates a handler.
    pub const fn new(repository: R, stock_store: S) -> Self {
        Self {
            repository,
            stock_store,
        }
    }

    /// Loads one product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product and repository errors.
    pub async fn handle(&self, product_id: ProductId) -> Result<ProductView> {
        let product = self.repository.find_by_id(product_id).await?;

        let available = match self.stock_store.get_available(product_id).await {
            Ok(available) => available,
            Err(error) => {
                tracing::debug!(
                    product_id = %product_id,
                    %error,
                    "stock cache miss on read; serving durable counters"
                );
                seed_cache_best_effort(&self.stock_store, product_id, product.stock()).await;
                product.stock().available()
            }
        };

        Ok(Self::view(&product, available))
    }

    fn view(product: &Product, available: i32) -> ProductView {
        ProductView {
            id: product.id(),
            sku: product.sku().to_string(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            status: product.status(),
            available,
            reserved: product.stock().reserved(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}
