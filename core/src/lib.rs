//! # Flash Sale Core
//!
//! Domain model and provider traits for the flash-sale inventory system.
//!
//! This crate holds everything that must stay pure and portable:
//!
//! - [`StockLedger`]: the immutable counter pair (`available`, `reserved`)
//!   and its legal transitions. Every mutation path in the system reduces to
//!   one of these transitions, whether it runs in-process or server-side in
//!   the shared fast store.
//! - [`Product`]: the aggregate that owns a ledger, plus its identity and
//!   status lifecycle.
//! - Provider traits ([`StockStore`], [`LockManager`], [`ProductRepository`],
//!   [`Clock`]): the seams where infrastructure is injected. Production
//!   implementations live in the `flashsale-redis` and `flashsale-postgres`
//!   crates; in-memory fakes with the same atomic contracts live in
//!   `flashsale-testing`.
//! - [`IdGenerator`]: the clock-based unique-ID allocator used to mint
//!   collision-free identifiers under concurrent load.
//!
//! ## Concurrency stance
//!
//! Ledger transitions are pure functions over the pre-state: they either
//! return the new value or an error, and never mutate their input. The
//! defense against overselling under contention is *not* in this crate:
//! it is the atomic contract that [`StockStore`] implementations must
//! uphold, documented on the trait.

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use error::{
    IdGenError, LockError, ProductError, RepositoryError, StockError, StockStoreError,
};
pub use idgen::IdGenerator;
pub use product::{Product, ProductCreationError, ProductId, ProductStatus};
pub use providers::{LockManager, LockToken, ProductRepository, StockStore};
pub use stock::{StockLedger, MAX_BATCH_QUANTITY};

pub mod clock;
pub mod error;
pub mod idgen;
pub mod product;
pub mod providers;
pub mod stock;
