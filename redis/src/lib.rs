//! Redis implementations of the flash-sale provider traits.
//!
//! Two stores live here:
//!
//! - [`RedisStockStore`]: the atomic counter pair per product. Every
//!   check-then-mutate transition runs as one server-side Lua script, so
//!   concurrent purchase attempts are serialized by Redis itself: no
//!   client-side locking, no lost updates.
//! - [`RedisLockManager`]: lease-based mutual exclusion via
//!   `SET ... NX PX` plus a compare-and-delete release script.
//!
//! Both share the connection idiom used across this workspace: one
//! [`redis::aio::ConnectionManager`] cloned per operation.

pub use lock_manager::RedisLockManager;
pub use stock_store::RedisStockStore;

pub mod lock_manager;
pub mod stock_store;
