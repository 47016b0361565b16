//! Settle a reservation after successful payment.

use crate::commands::seed_cache_best_effort;
use crate::error::Result;
use flashsale_core::{ProductId, ProductRepository, StockError, StockStore, StockStoreError};

/// Confirm request.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmReservationCommand {
    /// Product whose reservation settles.
    pub product_id: ProductId,
    /// Units leaving inventory.
    pub quantity: i32,
}

/// Handles [`ConfirmReservationCommand`]: the scripted cache transition
/// first, then the durable ledger.
pub struct ConfirmReservationHandler<R, S> {
    repository: R,
    stock_store: S,
}

impl<R, S> ConfirmReservationHandler<R, S>
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

    /// Confirms the reservation in both stores.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NonPositiveQuantity`] for a bad quantity,
    /// `InsufficientReserved` (from either store) when the reservation is
    /// short, and store errors otherwise. A cache miss or outage degrades
    /// to the durable store and re-seeds the cache afterwards.
    pub async fn handle(&self, command: ConfirmReservationCommand) -> Result<()> {
        if command.quantity <= 0 {
            return Err(StockError::NonPositiveQuantity.into());
        }

        let mut degraded = false;
        match self
            .stock_store
            .confirm_reservation(command.product_id, command.quantity)
            .await
        {
            Ok(()) => {}
            Err(
                error @ (StockStoreError::NotFound { .. } | StockStoreError::Unavailable { .. }),
            ) => {
                tracing::warn!(
                    product_id = %command.product_id,
                    %error,
                    "stock cache unusable; confirming against the durable store only"
                );
                degraded = true;
            }
            Err(error) => return Err(error.into()),
        }

        let product = self.repository.find_by_id(command.product_id).await?;
        let settled = product.stock().confirm_reservation(command.quantity)?;

        if let Err(error) = self
            .repository
            .update_stock(command.product_id, settled)
            .await
        {
            tracing::error!(
                product_id = %command.product_id,
                quantity = command.quantity,
                %error,
                "durable confirm failed after the cache settled; reconciliation will re-align the cache"
            );
            return Err(error.into());
        }

        if degraded {
            seed_cache_best_effort(&self.stock_store, command.product_id, settled).await;
        }

        tracing::info!(
            product_id = %command.product_id,
            quantity = command.quantity,
            "reservation confirmed"
        );
        Ok(())
    }
}
