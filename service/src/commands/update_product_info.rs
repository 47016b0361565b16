//! Update product metadata. Stock is untouched.

use crate::error::Result;
use flashsale_core::{Clock, ProductId, ProductRepository, ProductStatus};
use std::sync::Arc;

/// Metadata update request.
#[derive(Debug, Clone)]
pub struct UpdateProductInfoCommand {
    /// Product being updated.
    pub product_id: ProductId,
    /// New display name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New sale status.
    pub status: ProductStatus,
}

/// Handles [`UpdateProductInfoCommand`].
pub struct UpdateProductInfoHandler<R> {
    repository: R,
    clock: Arc<dyn Clock>,
}

impl<R> UpdateProductInfoHandler<R>
where
    R: ProductRepository,
{
    /// Creates a handler.
    pub fn new(repository: R, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Applies the update.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` for a blank name and repository errors.
    pub async fn handle(&self, command: UpdateProductInfoCommand) -> Result<()> {
        let mut product = self.repository.find_by_id(command.product_id).await?;
        product.update_info(
            command.name,
            command.description,
            command.status,
            self.clock.now(),
        )?;
        self.repository.save(&product).await?;

        tracing::info!(product_id = %command.product_id, "product info updated");
        Ok(())
    }
}
