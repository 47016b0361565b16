//! Error types for the flash-sale inventory core.

use thiserror::Error;

/// Errors raised by [`crate::StockLedger`] transitions.
///
/// These are business-rule violations, always recoverable by the caller
/// correcting its input or re-reading state. They must surface to the
/// request boundary unchanged: never swallow one.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StockError {
    /// Initial stock cannot be negative.
    #[error("stock cannot be negative")]
    NegativeStock,

    /// A restock quantity cannot be negative.
    #[error("quantity cannot be negative")]
    NegativeQuantity,

    /// A reservation quantity must be strictly positive.
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    /// Not enough available units to reserve or adjust away.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units the caller asked for.
        requested: i32,
        /// Units actually available.
        available: i32,
    },

    /// Not enough reserved units to confirm or cancel.
    #[error("insufficient reserved stock: requested {requested}, reserved {reserved}")]
    InsufficientReserved {
        /// Units the caller asked for.
        requested: i32,
        /// Units actually reserved.
        reserved: i32,
    },

    /// The restock would exceed the per-batch limit or overflow the counter.
    #[error("stock overflow")]
    Overflow,
}

/// Errors raised by the [`crate::Product`] aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// Product name cannot be empty.
    #[error("product name cannot be empty")]
    EmptyName,

    /// Product SKU cannot be empty.
    #[error("product SKU cannot be empty")]
    EmptySku,

    /// Product is already active.
    #[error("product is already active")]
    AlreadyActive,

    /// Product is already inactive.
    #[error("product is already inactive")]
    AlreadyInactive,

    /// A product with outstanding reservations cannot be deleted.
    #[error("cannot delete product with reserved stock")]
    HasReservedStock,
}

/// Errors raised by [`crate::LockManager`] implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lease is held by someone else and all attempts were exhausted.
    ///
    /// Surfaced to users as "try again", distinct from a hard failure.
    #[error("lock unavailable for resource: {resource}")]
    Unavailable {
        /// The contended resource key.
        resource: String,
    },

    /// The caller's deadline elapsed while waiting for the lease.
    #[error("lock acquisition cancelled for resource: {resource}")]
    Cancelled {
        /// The resource key being waited on.
        resource: String,
    },

    /// The shared store failed while managing the lease.
    #[error("lock store error: {message}")]
    Store {
        /// Underlying store failure.
        message: String,
    },
}

/// Errors raised by [`crate::StockStore`] implementations.
///
/// A `NotFound` on the read path must trigger fallback to the durable
/// store: a cache miss is never zero stock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockStoreError {
    /// The counter pair expired or was never initialized.
    #[error("stock for product {product_id} not found in store")]
    NotFound {
        /// The product whose counters are missing.
        product_id: i64,
    },

    /// The scripted transition found fewer reserved units than requested.
    #[error("insufficient reserved stock for product {product_id}")]
    InsufficientReserved {
        /// The product whose reservation was short.
        product_id: i64,
    },

    /// The store is unreachable or failed mid-operation.
    #[error("stock store unavailable: {message}")]
    Unavailable {
        /// Underlying store failure.
        message: String,
    },

    /// A counter held a value that does not parse as an integer.
    #[error("corrupt stock counter: {message}")]
    Corrupt {
        /// What failed to parse.
        message: String,
    },
}

/// Errors raised by [`crate::ProductRepository`] implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No product with the given identifier exists.
    #[error("product not found")]
    NotFound,

    /// The write conflicted with concurrent state (e.g. a guarded update
    /// matched no rows).
    #[error("conflicting update")]
    Conflict,

    /// The database failed.
    #[error("database error: {message}")]
    Database {
        /// Underlying database failure.
        message: String,
    },
}

/// Errors raised when constructing an [`crate::IdGenerator`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IdGenError {
    /// Node ID is outside the 10-bit range.
    #[error("invalid node id {node_id}: must be 0..=1023")]
    InvalidNodeId {
        /// The rejected node ID.
        node_id: u16,
    },

    /// The observed clock is behind the watermark persisted by a previous
    /// run of this node. Starting anyway would mint colliding IDs; the
    /// process must not come up until the clock catches up.
    #[error("clock rollback detected: persisted watermark {expected}ms, observed {observed}ms")]
    ClockRollback {
        /// Persisted last-issued timestamp, in milliseconds.
        expected: i64,
        /// Observed current timestamp, in milliseconds.
        observed: i64,
    },
}
