//! Use-case handlers.
//!
//! One handler struct per command, generic over the provider traits so
//! production wiring (Redis + Postgres) and tests (in-memory fakes) use
//! the same code paths.

pub mod add_stock;
pub mod adjust_stock;
pub mod cancel_reservation;
pub mod confirm_reservation;
pub mod create_product;
pub mod get_product;
pub mod remove_product;
pub mod reserve_stock;
pub mod update_product_info;

pub use add_stock::{AddStockCommand, AddStockHandler};
pub use adjust_stock::{AdjustStockCommand, AdjustStockHandler};
pub use cancel_reservation::{CancelReservationCommand, CancelReservationHandler};
pub use confirm_reservation::{ConfirmReservationCommand, ConfirmReservationHandler};
pub use create_product::{CreateProductCommand, CreateProductHandler};
pub use get_product::{GetProductHandler, ProductView};
pub use remove_product::{RemoveProductCommand, RemoveProductHandler};
pub use reserve_stock::{LockPolicy, ReserveOutcome, ReserveStockCommand, ReserveStockHandler};
pub use update_product_info::{UpdateProductInfoCommand, UpdateProductInfoHandler};

use flashsale_core::{ProductId, StockLedger, StockStore};

/// Lease key for serializing work on one product. Namespaced per product
/// so unrelated products never contend.
pub(crate) fn product_lock_key(product_id: ProductId) -> String {
    format!("product:{product_id}")
}

/// Overwrites the cache pair with fresh durable counters. Failures are
/// logged and left to the reconciliation job: cache seeding never fails a
/// use case that already committed durably.
pub(crate) async fn seed_cache_best_effort<S: StockStore>(
    store: &S,
    product_id: ProductId,
    stock: StockLedger,
) {
    if let Err(error) = store
        .init_stock(product_id, stock.available(), stock.reserved())
        .await
    {
        tracing::warn!(
            product_id = %product_id,
            %error,
            "stock cache seeding failed; reconciliation will repair it"
        );
    }
}
