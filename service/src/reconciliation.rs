//! Periodic cache reconciliation.
//!
//! The fast store drifts when a partial failure updates one store without
//! the other (a compensating cancel that never landed, a seeding write
//! that was dropped). This job bounds that drift: on a fixed interval it
//! reads the durable counters (the source of truth) and overwrites the
//! cache pair.
//!
//! Each product is synced under the same per-product lease the purchase
//! path holds, so a sweep never overwrites a counter mid-reservation with
//! a durable read that is already stale. A contended product is skipped
//! and picked up on the next sweep.

use crate::commands::product_lock_key;
use crate::error::{Result, ServiceError};
use flashsale_core::{LockError, LockManager, ProductId, ProductRepository, StockStore};
use std::time::Duration;

/// Outcome counts for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Products whose cache pair was overwritten.
    pub synced: usize,
    /// Products skipped because their lease was contended.
    pub skipped: usize,
    /// Products whose sync failed; retried next sweep.
    pub failed: usize,
}

/// Periodically resynchronizes cache counters from the durable store.
pub struct ReconciliationJob<R, S, L> {
    repository: R,
    stock_store: S,
    lock_manager: L,
    interval: Duration,
    lock_ttl: Duration,
}

impl<R, S, L> ReconciliationJob<R, S, L>
where
    R: ProductRepository,
    S: StockStore,
    L: LockManager,
{
    /// Creates a job.
    pub const fn new(
        repository: R,
        stock_store: S,
        lock_manager: L,
        interval: Duration,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            stock_store,
            lock_manager,
            interval,
            lock_ttl,
        }
    }

    /// Sweeps every product once.
    ///
    /// Per-product failures are counted and logged, not propagated: one
    /// broken product must not starve the rest of the sweep.
    ///
    /// # Errors
    ///
    /// Returns a repository error only when the product listing itself
    /// fails.
    pub async fn run_once(&self) -> Result<ReconciliationReport> {
        let ids = self.repository.list_ids().await?;
        let mut report = ReconciliationReport::default();

        for product_id in ids {
            match self.reconcile_product(product_id).await {
                Ok(true) => report.synced += 1,
                Ok(false) => report.skipped += 1,
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!(
                        product_id = %product_id,
                        %error,
                        "reconciliation failed for product; retrying next sweep"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Syncs one product under its lease. Returns `Ok(false)` when the
    /// lease was contended and the product was skipped.
    async fn reconcile_product(&self, product_id: ProductId) -> Result<bool> {
        let resource = product_lock_key(product_id);

        let outcome = self
            .lock_manager
            .with_lock(&resource, self.lock_ttl, || async {
                let product = self.repository.find_by_id(product_id).await?;
                let stock = product.stock();
                self.stock_store
                    .init_stock(product_id, stock.available(), stock.reserved())
                    .await?;
                tracing::debug!(
                    product_id = %product_id,
                    available = stock.available(),
                    reserved = stock.reserved(),
                    "cache counters overwritten from durable store"
                );
                Ok::<(), ServiceError>(())
            })
            .await;

        match outcome {
            Ok(inner) => inner.map(|()| true),
            Err(LockError::Unavailable { .. }) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// Drives [`ReconciliationJob::run_once`] on the configured interval
    /// until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("reconciliation job shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(report) => tracing::info!(
                            synced = report.synced,
                            skipped = report.skipped,
                            failed = report.failed,
                            "reconciliation sweep complete"
                        ),
                        Err(error) => tracing::error!(%error, "reconciliation sweep failed"),
                    }
                }
            }
        }
    }
}
