//! `PostgreSQL`-backed product repository.

use chrono::{DateTime, Utc};
use flashsale_core::{
    Product, ProductId, ProductRepository, ProductStatus, RepositoryError, StockLedger,
};
use sqlx::PgPool;
use std::sync::Arc;

/// One row of the `products` table.
type ProductRow = (
    i64,
    String,
    String,
    String,
    i16,
    i32,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// `PostgreSQL`-backed [`ProductRepository`].
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: Arc<PgPool>,
}

impl PostgresProductRepository {
    /// Creates a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    fn database_error(operation: &str, error: &sqlx::Error) -> RepositoryError {
        RepositoryError::Database {
            message: format!("{operation} failed: {error}"),
        }
    }

    fn row_to_product(row: ProductRow) -> Result<Product, RepositoryError> {
        let (id, sku, name, description, status, available, reserved, created_at, updated_at) =
            row;
        let stock =
            StockLedger::from_counts(available, reserved).map_err(|e| RepositoryError::Database {
                message: format!("persisted counters violate the stock invariant: {e}"),
            })?;
        Ok(Product::restore(
            ProductId::new(id),
            sku,
            name,
            description,
            ProductStatus::from_i16(status),
            created_at,
            updated_at,
            stock,
        ))
    }
}

impl ProductRepository for PostgresProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, sku, name, description, status,
                    stock_available, stock_reserved, created_at, updated_at
             FROM products
             WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| Self::database_error("find product", &e))?;

        row.map_or(Err(RepositoryError::NotFound), Self::row_to_product)
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, sku, name, description, status,
                    stock_available, stock_reserved, created_at, updated_at
             FROM products
             WHERE id = ANY($1)
             ORDER BY id",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| Self::database_error("find products", &e))?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id.value())
                .fetch_one(self.pool.as_ref())
                .await
                .map_err(|e| Self::database_error("check product existence", &e))?;

        Ok(row.0)
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO products
                 (id, sku, name, description, status,
                  stock_available, stock_reserved, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                 sku = EXCLUDED.sku,
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 status = EXCLUDED.status,
                 stock_available = EXCLUDED.stock_available,
                 stock_reserved = EXCLUDED.stock_reserved,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(product.id().value())
        .bind(product.sku())
        .bind(product.name())
        .bind(product.description())
        .bind(product.status().as_i16())
        .bind(product.stock().available())
        .bind(product.stock().reserved())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| Self::database_error("save product", &e))?;

        tracing::debug!(product_id = %product.id(), "saved product");
        Ok(())
    }

    async fn update_stock(
        &self,
        id: ProductId,
        stock: StockLedger,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products
             SET stock_available = $2, stock_reserved = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.value())
        .bind(stock.available())
        .bind(stock.reserved())
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| Self::database_error("update stock", &e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(
            product_id = %id,
            available = stock.available(),
            reserved = stock.reserved(),
            "updated durable stock counters"
        );
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.value())
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| Self::database_error("delete product", &e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(product_id = %id, "deleted product");
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<ProductId>, RepositoryError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM products ORDER BY id")
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| Self::database_error("list product ids", &e))?;

        Ok(rows.into_iter().map(|(id,)| ProductId::new(id)).collect())
    }
}
