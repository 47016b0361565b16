//! Restock a product.

use crate::commands::seed_cache_best_effort;
use crate::error::Result;
use flashsale_core::{ProductId, ProductRepository, StockStore};

/// Restock request.
#[derive(Debug, Clone, Copy)]
pub struct AddStockCommand {
    /// Product receiving units.
    pub product_id: ProductId,
    /// Units added to the available pool.
    pub quantity: i32,
}

/// Handles [`AddStockCommand`]: durable first, then the cache is
/// overwritten with the new counters.
pub struct AddStockHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> AddStockHandler<R, S>
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

    /// Adds the units.
    ///
    /// # Errors
    ///
    /// Returns the ledger's `NegativeQuantity` / `Overflow` violations and
    /// repository errors.
    pub async fn handle(&self, command: AddStockCommand) -> Result<()> {
        let product = self.repository.find_by_id(command.product_id).await?;
        let restocked = product.stock().add(command.quantity)?;

        self.repository
            .update_stock(command.product_id, restocked)
            .await?;
        seed_cache_best_effort(&self.stock_store, command.product_id, restocked).await;

        tracing::info!(
            product_id = %command.product_id,
            quantity = command.quantity,
            available = restocked.available(),
            "stock added"
        );
        Ok(())
    }
}
