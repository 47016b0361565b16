//! The product aggregate.
//!
//! One [`Product`] owns one [`StockLedger`]. The ledger is only ever
//! replaced with values produced by its own transitions: callers read it
//! with [`Product::stock`], run a transition, and install the result with
//! [`Product::set_stock`].

use crate::error::ProductError;
use crate::stock::StockLedger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier minted by the [`crate::IdGenerator`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProductId(i64);

impl ProductId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sale status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    /// Listed and purchasable.
    Active,
    /// Not purchasable; the state every product starts in.
    Inactive,
}

impl ProductStatus {
    /// Persisted representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Active => 1,
            Self::Inactive => 9,
        }
    }

    /// Rebuilds a status from its persisted representation. Unknown codes
    /// map to [`ProductStatus::Inactive`].
    #[must_use]
    pub const fn from_i16(code: i16) -> Self {
        match code {
            1 => Self::Active,
            _ => Self::Inactive,
        }
    }
}

/// A sellable product and its inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    description: String,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    stock: StockLedger,
}

impl Product {
    /// Creates a new product with the given initial stock. Products start
    /// inactive with nothing reserved.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EmptyName`] / [`ProductError::EmptySku`] for
    /// blank identity fields, or the ledger's
    /// [`crate::StockError::NegativeStock`] for a negative initial quantity.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        sku: impl Into<String>,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Self, ProductCreationError> {
        let name = name.into();
        let sku = sku.into();
        if name.is_empty() {
            return Err(ProductError::EmptyName.into());
        }
        if sku.is_empty() {
            return Err(ProductError::EmptySku.into());
        }
        let stock = StockLedger::new(quantity)?;
        Ok(Self {
            id,
            sku,
            name,
            description: description.into(),
            status: ProductStatus::Inactive,
            created_at: now,
            updated_at: now,
            stock,
        })
    }

    /// Rebuilds an aggregate from persisted state. The repository is
    /// trusted; no validation runs.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn restore(
        id: ProductId,
        sku: String,
        name: String,
        description: String,
        status: ProductStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        stock: StockLedger,
    ) -> Self {
        Self {
            id,
            sku,
            name,
            description,
            status,
            created_at,
            updated_at,
            stock,
        }
    }

    /// Updates name, description, and status. Stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EmptyName`] for a blank name.
    pub fn update_info(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        status: ProductStatus,
        now: DateTime<Utc>,
    ) -> Result<(), ProductError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        self.name = name;
        self.description = description.into();
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Puts the product on sale.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::AlreadyActive`] if it is already listed.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<(), ProductError> {
        if self.status == ProductStatus::Active {
            return Err(ProductError::AlreadyActive);
        }
        self.status = ProductStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Takes the product off sale.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::AlreadyInactive`] if it is already delisted.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Result<(), ProductError> {
        if self.status == ProductStatus::Inactive {
            return Err(ProductError::AlreadyInactive);
        }
        self.status = ProductStatus::Inactive;
        self.updated_at = now;
        Ok(())
    }

    /// Whether the product is currently purchasable.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Checks whether the product may be deleted. Outstanding reservations
    /// block deletion: confirming or cancelling them first keeps the
    /// ledger's total accounted for.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::HasReservedStock`] while units are reserved.
    pub const fn can_delete(&self) -> Result<(), ProductError> {
        if self.stock.reserved() > 0 {
            return Err(ProductError::HasReservedStock);
        }
        Ok(())
    }

    /// Installs a ledger produced by one of [`StockLedger`]'s own
    /// transitions.
    pub fn set_stock(&mut self, stock: StockLedger, now: DateTime<Utc>) {
        self.stock = stock;
        self.updated_at = now;
    }

    /// The product identifier.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    /// The stock-keeping unit.
    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The sale status.
    #[must_use]
    pub const fn status(&self) -> ProductStatus {
        self.status
    }

    /// The current stock ledger snapshot.
    #[must_use]
    pub const fn stock(&self) -> StockLedger {
        self.stock
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last-modified timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Failures when creating a product: either an identity-field violation or
/// an invalid initial ledger.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProductCreationError {
    /// An aggregate-level rule was violated.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// The initial stock was invalid.
    #[error(transparent)]
    Stock(#[from] crate::error::StockError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_products_start_inactive_with_nothing_reserved() {
        let product = Product::new(
            ProductId::new(1),
            "Mechanical Keyboard",
            "87-key, hot-swappable",
            "KB-87",
            50,
            test_now(),
        )
        .unwrap();
        assert_eq!(product.status(), ProductStatus::Inactive);
        assert!(!product.is_active());
        assert_eq!(product.stock().available(), 50);
        assert_eq!(product.stock().reserved(), 0);
    }

    #[test]
    fn blank_identity_fields_are_rejected() {
        let result = Product::new(ProductId::new(1), "", "d", "SKU", 1, test_now());
        assert!(matches!(
            result,
            Err(ProductCreationError::Product(ProductError::EmptyName))
        ));
        let result = Product::new(ProductId::new(1), "n", "d", "", 1, test_now());
        assert!(matches!(
            result,
            Err(ProductCreationError::Product(ProductError::EmptySku))
        ));
    }

    #[test]
    fn activation_is_not_idempotent() {
        let mut product =
            Product::new(ProductId::new(1), "n", "d", "SKU", 1, test_now()).unwrap();
        product.activate(test_now()).unwrap();
        assert_eq!(product.activate(test_now()), Err(ProductError::AlreadyActive));
        product.deactivate(test_now()).unwrap();
        assert_eq!(
            product.deactivate(test_now()),
            Err(ProductError::AlreadyInactive)
        );
    }

    #[test]
    fn reserved_stock_blocks_deletion() {
        let mut product =
            Product::new(ProductId::new(1), "n", "d", "SKU", 5, test_now()).unwrap();
        assert!(product.can_delete().is_ok());

        let held = product.stock().reserve(2).unwrap();
        product.set_stock(held, test_now());
        assert_eq!(product.can_delete(), Err(ProductError::HasReservedStock));

        let released = product.stock().cancel_reservation(2).unwrap();
        product.set_stock(released, test_now());
        assert!(product.can_delete().is_ok());
    }

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(
            ProductStatus::from_i16(ProductStatus::Active.as_i16()),
            ProductStatus::Active
        );
        assert_eq!(
            ProductStatus::from_i16(ProductStatus::Inactive.as_i16()),
            ProductStatus::Inactive
        );
        // Unknown codes degrade to inactive rather than failing a read.
        assert_eq!(ProductStatus::from_i16(42), ProductStatus::Inactive);
    }
}
