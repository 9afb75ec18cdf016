//! Per-user critical section around check → generate → increment.
//!
//! Holding the lock for the whole generation means two concurrent requests from one
//! user can never both pass the quota check for the same remaining slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Compare-and-delete so a holder whose TTL expired cannot release someone else's lock.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[async_trait]
pub trait UserLock: Send + Sync {
    /// Waits for the user's lock. The lock is held until the guard is dropped.
    async fn acquire(&self, user_id: Uuid) -> Result<LockGuard, AppError>;
}

/// Releases its lock on drop, on every exit path.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-process lock
// ────────────────────────────────────────────────────────────────────────────

type LockTable = Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>;

/// Single-process lock: one async mutex per user, pruned when no one holds or waits on it.
#[derive(Default)]
pub struct LocalUserLock {
    locks: LockTable,
}

impl LocalUserLock {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl UserLock for LocalUserLock {
    async fn acquire(&self, user_id: Uuid) -> Result<LockGuard, AppError> {
        let mutex = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(user_id).or_default().clone()
        };

        let guard = mutex.lock_owned().await;
        let table = self.locks.clone();

        Ok(LockGuard::new(move || {
            drop(guard);
            let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
            if table
                .get(&user_id)
                .is_some_and(|entry| Arc::strong_count(entry) == 1)
            {
                table.remove(&user_id);
            }
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis lock (multi-instance deployments)
// ────────────────────────────────────────────────────────────────────────────

/// `SET key token NX PX ttl` lock shared by every API instance.
/// The TTL bounds how long a crashed holder can block the user.
pub struct RedisUserLock {
    client: redis::Client,
    ttl: Duration,
}

impl RedisUserLock {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(user_id: Uuid) -> String {
        format!("vitae:generation-lock:{user_id}")
    }
}

fn redis_err(e: redis::RedisError) -> AppError {
    AppError::Internal(anyhow::anyhow!("Redis lock error: {e}"))
}

#[async_trait]
impl UserLock for RedisUserLock {
    async fn acquire(&self, user_id: Uuid) -> Result<LockGuard, AppError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_err)?;

        let key = Self::key(user_id);
        let token = Uuid::new_v4().to_string();
        let ttl_ms = self.ttl.as_millis() as u64;
        let deadline = Instant::now() + self.ttl;

        loop {
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(redis_err)?;

            if acquired.is_some() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(AppError::Conflict(
                    "Another CV generation for this account is still running".to_string(),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Ok(LockGuard::new(move || {
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                warn!("No runtime to release generation lock {key}; it will expire");
                return;
            };
            handle.spawn(async move {
                let script = redis::Script::new(RELEASE_SCRIPT);
                let released: redis::RedisResult<i32> =
                    script.key(&key).arg(&token).invoke_async(&mut conn).await;
                if let Err(e) = released {
                    warn!("Failed to release generation lock {key}: {e}; it will expire");
                }
            });
        }))
    }
}
