//! Delist a product.

use crate::error::Result;
use flashsale_core::{ProductId, ProductRepository, StockStore};

/// Removal request.
#[derive(Debug, Clone, Copy)]
pub struct RemoveProductCommand {
    /// Product to delete.
    pub product_id: ProductId,
}

/// Handles [`RemoveProductCommand`]: refuses while units are reserved,
/// then deletes the durable row and the cache pair.
pub struct RemoveProductHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> RemoveProductHandler<R, S>
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

    /// Removes the product.
    ///
    /// # Errors
    ///
    /// Returns `HasReservedStock` while reservations are outstanding,
    /// `NotFound` for an unknown product, and repository errors.
    pub async fn handle(&self, command: RemoveProductCommand) -> Result<()> {
        let product = self.repository.find_by_id(command.product_id).await?;
        product.can_delete()?;

        self.repository.delete(command.product_id).await?;

        if let Err(error) = self.stock_store.delete_stock(command.product_id).await {
            // The pair ages out via its TTL if this fails.
            tracing::warn!(
                product_id = %command.product_id,
                %error,
                "failed to drop cached stock counters for removed product"
            );
        }

        tracing::info!(product_id = %command.product_id, "product removed");
        Ok(())
    }
}
