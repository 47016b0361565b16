//! Distributed lock trait.
//!
//! A per-resource lease in the shared fast store, used to serialize
//! read-modify-write sections that the scripted stock operations cannot
//! express alone (reserve stock, then create an order, and compensate if
//! the order fails; that workflow spans two stores).
//!
//! Locking here is lease-based and best-effort under network partition:
//! deliberately not consensus. Crash safety comes from the TTL: a holder
//! that dies without releasing stops blocking others once the lease
//! expires.

use crate::error::LockError;
use std::time::Duration;

/// Opaque ownership token returned by a successful acquire.
///
/// Release requires the token and compares it against the live lease, so a
/// caller cannot release a lease it no longer owns after expiry and
/// re-acquisition by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    /// Wraps a token value produced by a lock manager implementation.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token value, for the compare step of compare-and-delete.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-resource distributed mutual exclusion with lease expiry.
///
/// Resource keys are namespaced by the caller (e.g. `product:{id}`) so
/// unrelated resources never contend.
pub trait LockManager: Send + Sync {
    /// Attempts to take the lease for `resource`, expiring after `ttl`
    /// even if never released.
    ///
    /// Returns `Ok(Some(token))` on success and `Ok(None)` when the lease
    /// is currently held by someone else.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Store`] if the shared store fails.
    fn acquire(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<Option<LockToken>, LockError>> + Send;

    /// Releases the lease if and only if `token` still owns it
    /// (compare-and-delete, never an unconditional delete).
    ///
    /// Returns `Ok(false)` when the lease already expired and was taken by
    /// another caller: nothing is deleted in that case.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Store`] if the shared store fails.
    fn release(
        &self,
        resource: &str,
        token: &LockToken,
    ) -> impl std::future::Future<Output = Result<bool, LockError>> + Send;

    /// Polls [`LockManager::acquire`] up to `max_retries` times, sleeping
    /// `interval` between attempts. Exhausting the attempts returns
    /// `Ok(None)`, not an error. Callers with a deadline wrap this future
    /// in `tokio::time::timeout`; the sleep points make it cancellation
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Store`] if the shared store fails.
    fn acquire_with_retry(
        &self,
        resource: &str,
        ttl: Duration,
        max_retries: u32,
        interval: Duration,
    ) -> impl std::future::Future<Output = Result<Option<LockToken>, LockError>> + Send
    where
        Self: Sized,
    {
        async move {
            for attempt in 1..=max_retries {
                if let Some(token) = self.acquire(resource, ttl).await? {
                    return Ok(Some(token));
                }
                if attempt < max_retries {
                    tokio::time::sleep(interval).await;
                }
            }
            Ok(None)
        }
    }

    /// Scoped acquisition: takes the lease, runs `operation`, and always
    /// attempts release before returning, surfacing the operation's output
    /// unchanged. If acquisition fails the operation is never invoked.
    ///
    /// A release failure is logged and left to lease expiry: the same
    /// crash-safety path as a holder that died.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] when the lease is held elsewhere
    /// and [`LockError::Store`] if the shared store fails.
    fn with_lock<F, Fut, T>(
        &self,
        resource: &str,
        ttl: Duration,
        operation: F,
    ) -> impl std::future::Future<Output = Result<T, LockError>> + Send
    where
        Self: Sized + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = T> + Send,
        T: Send,
    {
        async move {
            let Some(token) = self.acquire(resource, ttl).await? else {
                return Err(LockError::Unavailable {
                    resource: resource.to_string(),
                });
            };

            let output = operation().await;

            match self.release(resource, &token).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        resource,
                        "lease expired before release; a newer holder may exist"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        resource,
                        %error,
                        "failed to release lease; it will lapse via its ttl"
                    );
                }
            }

            Ok(output)
        }
    }
}
