//! In-memory distributed lock.

use flashsale_core::{LockError, LockManager, LockToken};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    expires_at: Instant,
}

/// In-memory [`LockManager`] honoring lease expiry, for tests that need
/// mutual exclusion without a running Redis.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLockManager {
    leases: Arc<Mutex<HashMap<String, Lease>>>,
}

impl InMemoryLockManager {
    /// Creates an empty lock manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live lease currently exists for `resource`.
    #[must_use]
    pub fn is_held(&self, resource: &str) -> bool {
        self.lock()
            .get(resource)
            .is_some_and(|lease| lease.expires_at > Instant::now())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Lease>> {
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockManager for InMemoryLockManager {
    async fn acquire(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        let mut leases = self.lock();
        let now = Instant::now();

        if leases
            .get(resource)
            .is_some_and(|lease| lease.expires_at > now)
        {
            return Ok(None);
        }

        let token = Uuid::new_v4().to_string();
        leases.insert(
            resource.to_string(),
            Lease {
                token: token.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(LockToken::new(token)))
    }

    async fn release(&self, resource: &str, token: &LockToken) -> Result<bool, LockError> {
        let mut leases = self.lock();
        // Compare-and-delete, like the Redis release script.
        if leases
            .get(resource)
            .is_some_and(|lease| lease.token == token.as_str())
        {
            leases.remove(resource);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
