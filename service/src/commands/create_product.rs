//! Onboard a new product.

use crate::error::Result;
use flashsale_core::{Clock, IdGenerator, Product, ProductId, ProductRepository, StockStore};
use std::sync::Arc;

/// Create request.
#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Stock-keeping unit.
    pub sku: String,
    /// Initial available quantity.
    pub quantity: i32,
}

/// Handles [`CreateProductCommand`]: mints an ID, persists the aggregate,
/// and seeds the stock cache.
pub struct CreateProductHandler<R, S> {
    id_generator: Arc<IdGenerator>,
    clock: Arc<dyn Clock>,
    repository: R,
    stock_store: S,
}

impl<R, S> CreateProductHandler<R, S>
where
    R: ProductRepository,
    S: StockStore,
{
    /// Creates a handler.
    pub fn new(
        id_generator: Arc<IdGenerator>,
        clock: Arc<dyn Clock>,
        repository: R,
        stock_store: S,
    ) -> Self {
        Self {
            id_generator,
            clock,
            repository,
            stock_store,
        }
    }

    /// Creates the product and returns its minted ID.
    ///
    /// Cache seeding is best-effort: a fast-store hiccup at onboarding is
    /// logged and repaired by the next reconciliation sweep, never failing
    /// the creation the durable store already accepted.
    ///
    /// # Errors
    ///
    /// Returns validation errors for blank identity fields or negative
    /// stock, and repository errors if the durable write fails.
    pub async fn handle(&self, command: CreateProductCommand) -> Result<ProductId> {
        let product_id = ProductId::new(self.id_generator.generate());

        let product = Product::new(
            product_id,
            command.name,
            command.description,
            command.sku,
            command.quantity,
            self.clock.now(),
        )?;

        self.repository.save(&product).await?;

        let stock = product.stock();
        if let Err(error) = self
            .stock_store
            .init_stock(product_id, stock.available(), stock.reserved())
            .await
        {
            tracing::warn!(
                product_id = %product_id,
                %error,
                "stock cache seeding failed at onboarding; reconciliation will seed it"
            );
        }

        tracing::info!(
            product_id = %product_id,
            sku = product.sku(),
            available = stock.available(),
            "product created"
        );
        Ok(product_id)
    }
}
