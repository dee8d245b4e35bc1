use crate::{LockError, RawLock, RawUnlock};
use std::sync::{Condvar, Mutex, PoisonError};

/// A raw lock that suspends waiting threads instead of spinning.
///
/// The "held" flag lives behind a [`std::sync::Mutex`] and waiters sleep on a
/// [`Condvar`]. Unlike a `MutexGuard`, ownership is not tied to a scope: the
/// lock is taken by [`RawLock::raw_lock`] and given back by
/// [`RawUnlock::raw_unlock`], possibly from a different function.
///
/// Wake-up order among waiters is whatever the platform condition variable
/// provides.
pub struct RawBlocking {
    held: Mutex<bool>,
    released: Condvar,
}

impl Default for RawBlocking {
    fn default() -> Self {
        Self::new()
    }
}

impl RawBlocking {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    /// Whether some caller currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RawLock for RawBlocking {
    fn raw_lock(&self) -> Result<(), LockError> {
        let mut held = self.held.lock().map_err(|_| LockError::Poisoned)?;
        while *held {
            held = self
                .released
                .wait(held)
                .map_err(|_| LockError::Poisoned)?;
        }
        *held = true;
        Ok(())
    }

    fn raw_try_lock(&self) -> Result<bool, LockError> {
        let mut held = self.held.lock().map_err(|_| LockError::Poisoned)?;
        if *held {
            return Ok(false);
        }
        *held = true;
        Ok(true)
    }

    fn raw_is_locked(&self) -> bool {
        self.is_locked()
    }
}

impl RawUnlock for RawBlocking {
    unsafe fn raw_unlock(&self) {
        // Nothing can panic while the state mutex is held, so a poisoned
        // state still carries a valid flag.
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}
