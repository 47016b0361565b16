//! Service-level error type.

use flashsale_core::{
    LockError, ProductCreationError, ProductError, RepositoryError, StockError, StockStoreError,
};
use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Everything a use-case handler can fail with.
///
/// Ledger and product errors are caller-visible business-rule violations
/// and surface unchanged. Store errors are infrastructure failures; the
/// handlers degrade around the recoverable ones (cache misses, outages)
/// before letting one escape here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A stock-ledger transition was rejected.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A product aggregate rule was violated.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// The distributed lock could not be taken or the store behind it
    /// failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The fast store failed in a way the handler could not degrade
    /// around.
    #[error(transparent)]
    StockStore(#[from] StockStoreError),

    /// The durable store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ProductCreationError> for ServiceError {
    fn from(error: ProductCreationError) -> Self {
        match error {
            ProductCreationError::Product(e) => Self::Product(e),
            ProductCreationError::Stock(e) => Self::Stock(e),
        }
    }
}

impl ServiceError {
    /// Whether the caller should simply retry (lock contention or a
    /// deadline that elapsed while queueing), as opposed to a hard
    /// failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Lock(LockError::Unavailable { .. }) | Self::Lock(LockError::Cancelled { .. })
        )
    }
}
