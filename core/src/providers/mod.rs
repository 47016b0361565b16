//! Provider traits.
//!
//! These traits are the seams where infrastructure is injected. Production
//! implementations live in `flashsale-redis` and `flashsale-postgres`;
//! in-memory fakes with the same atomic contracts live in
//! `flashsale-testing`.

pub mod lock_manager;
pub mod repository;
pub mod stock_store;

pub use lock_manager::{LockManager, LockToken};
pub use repository::ProductRepository;
pub use stock_store::StockStore;
