//! # Interrupt ports
//!
//! A port is the target-specific half of the toolbox's critical sections. It
//! offers exactly two operations:
//!
//! * **disable**: keep every other flow of control out, returning an opaque
//!   [`CpuStatus`] describing the state before the call, and
//! * **restore**: hand that status back to leave the protected region.
//!
//! ## Backends
//!
//! | backend          | target                         | "disable" means              |
//! |------------------|--------------------------------|------------------------------|
//! | [`LockPort`]     | anything with a raw lock       | acquire a process-wide lock  |
//! | [`host`]         | hosted (`std`)                 | [`LockPort`] over a blocking lock |
//! | `x86::X86Port`   | `x86_64`, ring 0 (`x86`)       | `cli`, restored with `sti`   |
//!
//! Backends are picked by composition: code that needs a critical section is
//! generic over [`InterruptPort`] or is handed a `&'static` port.
//!
//! ## Status tokens
//!
//! A [`CpuStatus`] only has meaning to the backend that produced it. The type
//! deliberately implements no equality; never pass a status obtained from one
//! port to another.
//!
//! ## Errors
//!
//! The `try_*` methods report failures as [`PortError`]. The plain
//! [`InterruptPort::disable`] and [`InterruptPort::restore`] treat them as
//! fatal: lock failures panic, and restoring through a port that was never
//! initialized is reported to the [`assert`] hook.
//!
//! ```
//! use toolbox_port::InterruptPort;
//! use toolbox_port::host::HOST_PORT;
//!
//! let status = HOST_PORT.disable();
//! // ... touch state shared with other threads ...
//! HOST_PORT.restore(status);
//! ```

#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![allow(unsafe_code)]

pub mod assert;
#[cfg(feature = "std")]
pub mod host;
mod lock_port;
mod state;
#[cfg(all(feature = "x86", target_arch = "x86_64"))]
pub mod x86;

pub use lock_port::LockPort;
pub use state::SectionState;
pub use toolbox_sync::LockError;

/// Opaque snapshot of the interrupt state taken by [`InterruptPort::disable`].
#[must_use]
#[derive(Debug, Clone, Copy)]
pub struct CpuStatus(usize);

impl CpuStatus {
    /// The status handed out by backends that have nothing to remember.
    pub const PLACEHOLDER: Self = Self(0);

    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("critical section lock unavailable: {0}")]
    Lock(#[from] LockError),
    #[error("critical section lock was never initialized")]
    Uninitialized,
    #[error("critical section state corrupted")]
    StateCorrupted,
}

pub trait InterruptPort {
    /// Disables interrupts, returning the state to restore later.
    ///
    /// # Errors
    /// Returns [`PortError`] if the backend cannot establish the protected state.
    fn try_disable(&self) -> Result<CpuStatus, PortError>;

    /// Restores the interrupt state captured by [`InterruptPort::try_disable`].
    ///
    /// # Errors
    /// Returns [`PortError::Uninitialized`] if interrupts were never disabled
    /// through this port.
    fn try_restore(&self, status: CpuStatus) -> Result<(), PortError>;

    /// Whether the calling flow is the one that disabled interrupts.
    ///
    /// Backends that cannot tell flows apart answer `true`: with a single
    /// flow of control whoever asks is the holder.
    fn is_held_by_caller(&self) -> bool {
        true
    }

    /// Like [`InterruptPort::try_disable`], but failures are fatal.
    ///
    /// # Panics
    /// Panics if the backend reports an error.
    #[track_caller]
    fn disable(&self) -> CpuStatus {
        match self.try_disable() {
            Ok(status) => status,
            Err(e) => panic!("failed to disable interrupts: {e}"),
        }
    }

    /// Like [`InterruptPort::try_restore`], but failures are fatal.
    ///
    /// # Panics
    /// Panics on lock failures. Restoring through an uninitialized port is
    /// reported to [`assert::fail`], which panics unless a custom handler is
    /// installed.
    #[track_caller]
    fn restore(&self, status: CpuStatus) {
        match self.try_restore(status) {
            Ok(()) => {}
            Err(PortError::Uninitialized) => assert::fail(&PortError::Uninitialized),
            Err(e) => panic!("failed to restore interrupts: {e}"),
        }
    }
}

impl<P> InterruptPort for &P
where
    P: InterruptPort + ?Sized,
{
    #[inline]
    fn try_disable(&self) -> Result<CpuStatus, PortError> {
        (**self).try_disable()
    }

    #[inline]
    fn try_restore(&self, status: CpuStatus) -> Result<(), PortError> {
        (**self).try_restore(status)
    }

    #[inline]
    fn is_held_by_caller(&self) -> bool {
        (**self).is_held_by_caller()
    }
}
