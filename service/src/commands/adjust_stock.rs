//! Correct a product's available count (shrinkage, damage, recounts).

use crate::commands::seed_cache_best_effort;
use crate::error::Result;
use flashsale_core::{ProductId, ProductRepository, StockStore};

/// Adjustment request. The delta may be negative.
#[derive(Debug, Clone, Copy)]
pub struct AdjustStockCommand {
    /// Product being corrected.
    pub product_id: ProductId,
    /// Signed change to the available pool.
    pub delta: i32,
}

/// Handles [`AdjustStockCommand`]: durable first, then the cache is
/// overwritten with the new counters.
pub struct AdjustStockHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> AdjustStockHandler<R, S>
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

    /// Applies the adjustment.
    ///
    /// # Errors
    ///
    /// Returns the ledger's `InsufficientStock` when the delta would take
    /// the available count below zero, and repository errors.
    pub async fn handle(&self, command: AdjustStockCommand) -> Result<()> {
        let product = self.repository.find_by_id(command.product_id).await?;
        let adjusted = product.stock().adjust_available(command.delta)?;

        self.repository
            .update_stock(command.product_id, adjusted)
            .await?;
        seed_cache_best_effort(&self.stock_store, command.product_id, adjusted).await;

        tracing::info!(
            product_id = %command.product_id,
            delta = command.delta,
            available = adjusted.available(),
            "stock adjusted"
        );
        Ok(())
    }
}
