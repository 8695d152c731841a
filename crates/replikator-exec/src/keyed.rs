//! Keyed execution serializer — one exclusive lock per resource name.
//!
//! Locks are created on first use and live for the rest of the process.
//! The table only grows; its size is bounded by the number of distinct
//! names ever addressed.
//!
//! Mutual exclusion only: waiters are not guaranteed FIFO order, and a
//! lock is not reentrant.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

/// Holds the lock for one resource key. Released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        trace!(key = %self.key, "resource lock released");
    }
}

/// Table of per-key locks.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `key`, creating it if this is the first use.
    ///
    /// The table mutex is held across lookup and insert, so concurrent
    /// first use of a key always resolves to the same lock.
    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(key) {
            return lock.clone();
        }
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(key.to_string(), lock.clone());
        debug!(key, total = locks.len(), "created resource lock");
        lock
    }

    /// Acquire the lock for `key`, waiting if another operation holds it.
    ///
    /// An empty key is unkeyed: returns `None` immediately without locking.
    pub async fn lock(&self, key: &str) -> Option<KeyGuard> {
        if key.is_empty() {
            return None;
        }

        let lock = self.lock_for(key);
        let guard = match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(key, "waiting for resource lock");
                lock.lock_owned().await
            }
        };
        trace!(key, "resource lock acquired");

        Some(KeyGuard {
            key: key.to_string(),
            _guard: guard,
        })
    }

    /// Run `body` while holding the lock for `key`.
    ///
    /// The lock is released when `body` finishes, fails, panics, or the
    /// returned future is dropped. An empty key runs `body` unsynchronized.
    pub async fn with_lock<F, Fut, T>(&self, key: &str, body: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock(key).await;
        body().await
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
