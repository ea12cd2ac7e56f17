use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::UserId;

type LockMap = Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>;

/// One async mutex per user, serializing each user's load-decide-commit cycle.
///
/// Entries exist only while some handler holds or waits for them.
#[derive(Default)]
pub struct UserLocks {
    locks: LockMap,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other handler holds `user`'s lock.
    pub async fn lock(&self, user: UserId) -> UserGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(user).or_default())
        };
        UserGuard {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
            user,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// Holds a user's lock; drops the map entry on release if nobody else wants it.
pub struct UserGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
    user: UserId,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        // the map and this guard; any waiter holds a third reference
        if Arc::strong_count(OwnedMutexGuard::mutex(&guard)) == 2 {
            locks.remove(&self.user);
        }
        drop(guard);
    }
}
