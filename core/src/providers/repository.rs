//! Product repository trait: the port to the durable relational store.
//!
//! The durable store is the source of truth for stock; the fast store is a
//! cache in front of it. The repository is deliberately narrow: aggregate
//! CRUD plus a guarded stock-column update.

use crate::error::RepositoryError;
use crate::product::{Product, ProductId};
use crate::stock::StockLedger;

/// Durable storage port for the product aggregate.
pub trait ProductRepository: Send + Sync {
    /// Loads one aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown ID and
    /// [`RepositoryError::Database`] on store failure.
    fn find_by_id(
        &self,
        id: ProductId,
    ) -> impl std::future::Future<Output = Result<Product, RepositoryError>> + Send;

    /// Loads several aggregates; unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on store failure.
    fn find_by_ids(
        &self,
        ids: &[ProductId],
    ) -> impl std::future::Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Whether a product with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on store failure.
    fn exists(
        &self,
        id: ProductId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Inserts or fully updates an aggregate in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on store failure.
    fn save(
        &self,
        product: &Product,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persists new stock counters for a product, leaving the rest of the
    /// row untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matched and
    /// [`RepositoryError::Database`] on store failure.
    fn update_stock(
        &self,
        id: ProductId,
        stock: StockLedger,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Deletes an aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no row matched and
    /// [`RepositoryError::Database`] on store failure.
    fn delete(
        &self,
        id: ProductId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All product IDs, for the reconciliation sweep.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on store failure.
    fn list_ids(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ProductId>, RepositoryError>> + Send;
}
