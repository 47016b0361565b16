//! The purchase attempt: reserve stock under contention.

use crate::commands::{product_lock_key, seed_cache_best_effort};
use crate::error::{Result, ServiceError};
use flashsale_core::{
    LockError, LockManager, ProductId, ProductRepository, StockError, StockStore,
    StockStoreError,
};
use std::time::Duration;

/// How the reserve handler takes the per-product lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Lease TTL; a crashed holder stops blocking others after this long.
    pub ttl: Duration,
    /// Acquire attempts before giving up.
    pub max_retries: u32,
    /// Sleep between acquire attempts.
    pub retry_interval: Duration,
    /// Overall deadline for the acquire loop; elapsing maps to
    /// [`LockError::Cancelled`].
    pub acquire_deadline: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            max_retries: 3,
            retry_interval: Duration::from_millis(100),
            acquire_deadline: Duration::from_secs(2),
        }
    }
}

/// Reserve request.
#[derive(Debug, Clone, Copy)]
pub struct ReserveStockCommand {
    /// Product to reserve from.
    pub product_id: ProductId,
    /// Units to hold.
    pub quantity: i32,
}

/// Result of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The units are held pending order completion.
    Reserved,
    /// Not enough stock: a normal flash-sale outcome, surfaced as a
    /// declined purchase rather than an error.
    Declined,
}

/// Handles [`ReserveStockCommand`].
///
/// The fast store takes the write; the durable store follows inside the
/// same lease. A durable failure after a successful cache reserve triggers
/// the compensating cache cancel: the system's only cross-store
/// compensation, best-effort, with reconciliation as the backstop.
pub struct ReserveStockHandler<R, S, L> {
    repository: R,
    stock_store: S,
    lock_manager: L,
    lock_policy: LockPolicy,
}

impl<R, S, L> ReserveStockHandler<R, S, L>
where
    R: ProductRepository,
    S: StockStore,
    L: LockManager,
{
    /// Creates a handler.
    pub const fn new(
        repository: R,
        stock_store: S,
        lock_manager: L,
        lock_policy: LockPolicy,
    ) -> Self {
        Self {
            repository,
            stock_store,
            lock_manager,
            lock_policy,
        }
    }

    /// Attempts the reservation.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NonPositiveQuantity`] for a bad quantity,
    /// [`LockError::Unavailable`] / [`LockError::Cancelled`] under
    /// contention, and store errors the handler could not degrade around.
    /// Insufficient stock is `Ok(ReserveOutcome::Declined)`, not an error.
    pub async fn handle(&self, command: ReserveStockCommand) -> Result<ReserveOutcome> {
        if command.quantity <= 0 {
            return Err(StockError::NonPositiveQuantity.into());
        }

        let resource = product_lock_key(command.product_id);
        let policy = self.lock_policy;

        let acquire = self.lock_manager.acquire_with_retry(
            &resource,
            policy.ttl,
            policy.max_retries,
            policy.retry_interval,
        );
        let token = match tokio::time::timeout(policy.acquire_deadline, acquire).await {
            Ok(Ok(Some(token))) => token,
            Ok(Ok(None)) => {
                return Err(LockError::Unavailable { resource }.into());
            }
            Ok(Err(error)) => return Err(error.into()),
            Err(_elapsed) => {
                return Err(LockError::Cancelled { resource }.into());
            }
        };

        let outcome = self.reserve_under_lock(command).await;

        match self.lock_manager.release(&resource, &token).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                %resource,
                "lease expired before release; a newer holder may exist"
            ),
            Err(error) => tracing::warn!(
                %resource,
                %error,
                "failed to release lease; it will lapse via its ttl"
            ),
        }

        outcome
    }

    async fn reserve_under_lock(&self, command: ReserveStockCommand) -> Result<ReserveOutcome> {
        match self
            .stock_store
            .reserve(command.product_id, command.quantity)
            .await
        {
            Ok(true) => self.persist_or_compensate(command).await,
            Ok(false) => {
                tracing::info!(
                    product_id = %command.product_id,
                    quantity = command.quantity,
                    "purchase declined: insufficient stock"
                );
                Ok(ReserveOutcome::Declined)
            }
            Err(
                error @ (StockStoreError::NotFound { .. } | StockStoreError::Unavailable { .. }),
            ) => {
                // Cache miss or outage: the cache is never the source of
                // truth, so fall back to the durable ledger.
                tracing::warn!(
                    product_id = %command.product_id,
                    %error,
                    "stock cache unusable; reserving from the durable store"
                );
                self.reserve_from_durable(command).await
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Cache reserve succeeded; make the durable store agree or give the
    /// units back.
    async fn persist_or_compensate(&self, command: ReserveStockCommand) -> Result<ReserveOutcome> {
        match self.persist_reservation(command).await {
            Ok(()) => Ok(ReserveOutcome::Reserved),
            Err(error) => {
                if let Err(cancel_error) = self
                    .stock_store
                    .cancel_reservation(command.product_id, command.quantity)
                    .await
                {
                    tracing::error!(
                        product_id = %command.product_id,
                        quantity = command.quantity,
                        %cancel_error,
                        "compensating cache cancel failed; reconciliation will repair the counters"
                    );
                }
                Err(error)
            }
        }
    }

    async fn persist_reservation(&self, command: ReserveStockCommand) -> Result<()> {
        let product = self.repository.find_by_id(command.product_id).await?;
        // The durable ledger re-validates: if the cache had drifted ahead
        // of the truth, the transition fails here and the cache hold is
        // compensated away.
        let held = product.stock().reserve(command.quantity)?;
        self.repository
            .update_stock(command.product_id, held)
            .await?;
        Ok(())
    }

    /// Durable-only path for a cold or unavailable cache. Runs under the
    /// same lease, so the read-modify-write cannot interleave with another
    /// reservation for this product.
    async fn reserve_from_durable(&self, command: ReserveStockCommand) -> Result<ReserveOutcome> {
        let product = self.repository.find_by_id(command.product_id).await?;

        let held = match product.stock().reserve(command.quantity) {
            Ok(held) => held,
            Err(StockError::InsufficientStock { .. }) => {
                seed_cache_best_effort(&self.stock_store, command.product_id, product.stock())
                    .await;
                return Ok(ReserveOutcome::Declined);
            }
            Err(error) => return Err(error.into()),
        };

        self.repository
            .update_stock(command.product_id, held)
            .await?;
        seed_cache_best_effort(&self.stock_store, command.product_id, held).await;

        Ok(ReserveOutcome::Reserved)
    }
}
