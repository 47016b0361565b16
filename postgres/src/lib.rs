//! `PostgreSQL` product repository for the flash-sale inventory core.
//!
//! Implements the `ProductRepository` port from `flashsale-core` over a
//! `sqlx` connection pool. The `products` table carries the durable stock
//! counters (`stock_available`, `stock_reserved`): the source of truth
//! that the fast-store cache is reconciled from.
//!
//! Migrations live in `migrations/` and are applied by the service
//! bootstrap with `sqlx::migrate!`.

pub use repository::PostgresProductRepository;

pub mod repository;

/// Embedded migrations for the products schema.
///
/// Run by the service bootstrap before any repository is handed out.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
