//! # Toolbox synchronization primitives
//!
//! Low-level building blocks shared by the interrupt ports and critical
//! sections of the toolbox:
//!
//! * [`RawLock`] / [`RawUnlock`]: a guard-less lock interface. Acquisition and
//!   release may happen in different function calls, which is what an
//!   "interrupts disable / restore" pair needs.
//! * [`RawSpin`]: busy-waiting raw lock, usable without an operating system.
//! * [`RawBlocking`] (feature `std`): raw lock that parks waiting threads.
//! * [`SyncOnceCell`]: compare-and-swap guarded one-time initialization.

#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "std")]
mod raw_blocking;
mod raw_spin;
mod sync_once_cell;

#[cfg(feature = "std")]
pub use raw_blocking::RawBlocking;
pub use raw_spin::RawSpin;
pub use sync_once_cell::SyncOnceCell;

/// Failure reported by a raw lock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// The lock object could not be constructed.
    #[error("lock construction failed")]
    Construction,
    /// The lock's internal bookkeeping was left in an unknown state by a panic.
    #[error("lock poisoned")]
    Poisoned,
}

pub trait RawLock {
    /// Blocks until the lock is held by the caller.
    ///
    /// # Errors
    /// Returns [`LockError`] if the underlying primitive is unusable.
    fn raw_lock(&self) -> Result<(), LockError>;

    /// Takes the lock if it is free; never blocks.
    ///
    /// # Errors
    /// Returns [`LockError`] if the underlying primitive is unusable.
    fn raw_try_lock(&self) -> Result<bool, LockError>;

    /// Whether some caller currently holds the lock.
    fn raw_is_locked(&self) -> bool;
}

pub trait RawUnlock {
    /// Releases the lock.
    ///
    /// # Safety
    /// The caller must currently hold the lock.
    unsafe fn raw_unlock(&self);
}
