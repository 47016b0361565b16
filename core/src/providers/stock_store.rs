//! Stock store trait.
//!
//! This trait abstracts the shared fast store that fronts the durable
//! database during a flash sale. It maintains two counters per product
//! (`available`, `reserved`) and exposes the ledger transitions as single
//! atomic round-trips.

use crate::error::StockStoreError;
use crate::product::ProductId;

/// Atomic counter-pair store for product stock.
///
/// This is the primary defense against overselling under load, so the
/// atomicity contract is strict:
///
/// # Atomicity
///
/// **CRITICAL**: every check-then-mutate operation (`reserve`,
/// `confirm_reservation`, `cancel_reservation`) MUST execute without
/// interleaving from concurrent callers: one server-side scripted
/// operation, never a read, a local decision, and a write as three separate
/// store calls. The latter is a classic lost-update race and oversells.
///
/// For a single product key all operations observe a total order; across
/// different products no ordering is guaranteed and none is required.
///
/// # Consistency
///
/// The store is a cache, never the source of truth. A missing counter pair
/// is reported as [`StockStoreError::NotFound`]: callers fall back to the
/// durable store rather than treating absence as zero stock.
pub trait StockStore: Send + Sync {
    /// Idempotently overwrites both counters and refreshes their TTL.
    ///
    /// Used at product onboarding and by the reconciliation job: the only
    /// two places cache values are forcibly overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::Unavailable`] if the store cannot be
    /// reached.
    fn init_stock(
        &self,
        product_id: ProductId,
        available: i32,
        reserved: i32,
    ) -> impl std::future::Future<Output = Result<(), StockStoreError>> + Send;

    /// Reads the available counter.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::NotFound`] when the pair expired or was
    /// never initialized (cache miss is NOT zero) and
    /// [`StockStoreError::Unavailable`] on store failure.
    fn get_available(
        &self,
        product_id: ProductId,
    ) -> impl std::future::Future<Output = Result<i32, StockStoreError>> + Send;

    /// Atomically checks `available >= quantity` and, if so, moves
    /// `quantity` units from available to reserved.
    ///
    /// Returns `Ok(false)`, with no mutation, when stock is insufficient.
    /// That is an expected outcome of a flash sale, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::NotFound`] when the counter pair is
    /// absent and [`StockStoreError::Unavailable`] on store failure.
    fn reserve(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> impl std::future::Future<Output = Result<bool, StockStoreError>> + Send;

    /// Atomically checks `reserved >= quantity` and decrements reserved.
    /// Available is untouched: the goods have left inventory.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::InsufficientReserved`] when fewer units
    /// are reserved than requested, [`StockStoreError::NotFound`] when the
    /// pair is absent, and [`StockStoreError::Unavailable`] on store
    /// failure.
    fn confirm_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> impl std::future::Future<Output = Result<(), StockStoreError>> + Send;

    /// Atomically checks `reserved >= quantity`, returns `quantity` units
    /// to available, and decrements reserved.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::InsufficientReserved`] when fewer units
    /// are reserved than requested, [`StockStoreError::NotFound`] when the
    /// pair is absent, and [`StockStoreError::Unavailable`] on store
    /// failure.
    fn cancel_reservation(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> impl std::future::Future<Output = Result<(), StockStoreError>> + Send;

    /// Removes the counter pair. Lifecycle maintenance only.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::Unavailable`] on store failure.
    fn delete_stock(
        &self,
        product_id: ProductId,
    ) -> impl std::future::Future<Output = Result<(), StockStoreError>> + Send;

    /// Extends the counter pair's TTL. Lifecycle maintenance only.
    ///
    /// # Errors
    ///
    /// Returns [`StockStoreError::Unavailable`] on store failure.
    fn refresh_ttl(
        &self,
        product_id: ProductId,
    ) -> impl std::future::Future<Output = Result<(), StockStoreError>> + Send;
}
