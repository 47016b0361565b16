//! Return a reservation to the available pool.

use crate::commands::seed_cache_best_effort;
use crate::error::Result;
use flashsale_core::{ProductId, ProductRepository, StockError, StockStore, StockStoreError};

/// Cancel request (order abandoned, payment failed, or hold timed out).
#[derive(Debug, Clone, Copy)]
pub struct CancelReservationCommand {
    /// Product whose reservation is released.
    pub product_id: ProductId,
    /// Units going back on the shelf.
    pub quantity: i32,
}

/// Handles [`CancelReservationCommand`]: the scripted cache transition
/// first, then the durable ledger.
pub struct CancelReservationHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> CancelReservationHandler<R, S>
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

    /// Cancels the reservation in both stores.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NonPositiveQuantity`] for a bad quantity,
    /// `InsufficientReserved` (from either store) when the reservation is
    /// short, and store errors otherwise. A cache miss or outage degrades
    /// to the durable store and re-seeds the cache afterwards.
    pub async fn handle(&self, command: CancelReservationCommand) -> Result<()> {
        if command.quantity <= 0 {
            return Err(StockError::NonPositiveQuantity.into());
        }

        let mut degraded = false;
        match self
            .stock_store
            .cancel_reservation(command.product_id, command.quantity)
            .await
        {
            Ok(()) => {}
            Err(
                error @ (StockStoreError::NotFound { .. } | StockStoreError::Unavailable { .. }),
            ) => {
                tracing::warn!(
                    product_id = %command.product_id,
                    %error,
                    "stock cache unusable; cancelling against the durable store only"
                );
                degraded = true;
            }
            Err(error) => return Err(error.into()),
        }

        let product = self.repository.find_by_id(command.product_id).await?;
        let released = product.stock().cancel_reservation(command.quantity)?;

        if let Err(error) = self
            .repository
            .update_stock(command.product_id, released)
            .await
        {
            tracing::error!(
                product_id = %command.product_id,
                quantity = command.quantity,
                %error,
                "durable cancel failed after the cache released; reconciliation will re-align the cache"
            );
            return Err(error.into());
        }

        if degraded {
            seed_cache_best_effort(&self.stock_store, command.product_id, released).await;
        }

        tracing::info!(
            product_id = %command.product_id,
            quantity = command.quantity,
            "reservation cancelled"
        );
        Ok(())
    }
}
