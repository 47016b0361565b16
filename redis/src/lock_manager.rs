//! Redis-backed distributed lock.
//!
//! A lease is one key, `lock:{resource}`, created with `SET ... NX PX` so
//! it exists only if no live lease does and expires on its own if the
//! holder crashes. The value is an opaque ownership token; release is a
//! compare-and-delete script, so a caller whose lease expired and was
//! re-acquired by someone else cannot delete the newer holder's lease.

use flashsale_core::{LockError, LockManager, LockToken};
use redis::aio::ConnectionManager;
use redis::Client;
use std::time::Duration;
use uuid::Uuid;

/// Deletes the lease only while the caller's token still owns it.
const RELEASE_SCRIPT: &str = r"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end
    return 0
";

/// `Redis`-backed [`LockManager`].
///
/// # Thread Safety
///
/// `Clone` and shareable; each clone shares the same [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisLockManager {
    conn_manager: ConnectionManager,
}

impl RedisLockManager {
    /// Connects a new lock manager.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Store`] if the URL is malformed or the
    /// connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self, LockError> {
        let client = Client::open(redis_url).map_err(|e| LockError::Store {
            message: format!("failed to create Redis client: {e}"),
        })?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| LockError::Store {
                message: format!("failed to create Redis connection manager: {e}"),
            })?;

        tracing::info!("RedisLockManager initialized");

        Ok(Self { conn_manager })
    }

    fn lock_key(resource: &str) -> String {
        format!("lock:{resource}")
    }
}

impl LockManager for RedisLockManager {
    async fn acquire(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        let mut conn = self.conn_manager.clone();
        let key = Self::lock_key(resource);
        let token = Uuid::new_v4().to_string();
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        // SET key token NX PX ttl: create the lease only if absent, with
        // expiry so a crashed holder cannot block others forever.
        let created: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis)
            .query_async(&mut conn)
            .await
            .map_err(|e| LockError::Store {
                message: format!("acquire failed: {e}"),
            })?;

        if created.is_some() {
            tracing::debug!(resource, ttl_millis, "lease acquired");
            Ok(Some(LockToken::new(token)))
        } else {
            Ok(None)
        }
    }

    async fn release(&self, resource: &str, token: &LockToken) -> Result<bool, LockError> {
        let mut conn = self.conn_manager.clone();

        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(Self::lock_key(resource))
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Store {
                message: format!("release failed: {e}"),
            })?;

        if deleted == 1 {
            tracing::debug!(resource, "lease released");
            Ok(true)
        } else {
            tracing::debug!(resource, "stale release ignored (token no longer owns lease)");
            Ok(false)
        }
    }
}
