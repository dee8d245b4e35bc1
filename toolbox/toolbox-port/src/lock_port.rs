use crate::state::{HolderId, SectionCell, SectionState};
use crate::{CpuStatus, InterruptPort, PortError};
use log::{debug, trace, warn};
use toolbox_sync::{LockError, RawLock, RawUnlock, SyncOnceCell};

/// Interrupt port that emulates "interrupts disabled" with a lock.
///
/// Meant for targets without interrupt masking in reach, such as a process on
/// a general-purpose operating system. Disabling interrupts acquires the lock,
/// which keeps every other thread out until interrupts are restored.
///
/// * The lock is built on the first [`InterruptPort::try_disable`] and lives
///   as long as the port.
/// * The port does not count: disabling again from the flow that already
///   holds it returns immediately, and a single restore releases it.
/// * Restoring while not holding the port is a no-op.
/// * Restoring before the lock was ever built is an error
///   ([`PortError::Uninitialized`]).
/// * A thread that is tearing down its thread-locals has no identity and
///   gets [`PortError::StateCorrupted`] from either operation.
///
/// The returned [`CpuStatus`] is always [`CpuStatus::PLACEHOLDER`].
///
/// # Examples
///
/// ```
/// use toolbox_port::{InterruptPort, LockPort, SectionState};
/// use toolbox_sync::RawSpin;
///
/// static PORT: LockPort<RawSpin> = LockPort::new();
///
/// let status = PORT.disable();
/// assert_eq!(PORT.state(), SectionState::Disabled);
/// PORT.restore(status);
/// assert_eq!(PORT.state(), SectionState::Enabled);
/// ```
pub struct LockPort<R> {
    lock: SyncOnceCell<R>,
    init: fn() -> Result<R, LockError>,
    state: SectionCell,
}

#[allow(clippy::unnecessary_wraps)]
fn default_lock<R: Default>() -> Result<R, LockError> {
    Ok(R::default())
}

impl<R> LockPort<R> {
    /// Creates a port whose lock will be built by `init` on first use.
    #[must_use]
    pub const fn with_init(init: fn() -> Result<R, LockError>) -> Self {
        Self {
            lock: SyncOnceCell::new(),
            init,
            state: SectionCell::new(),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    #[must_use]
    pub fn state(&self) -> SectionState {
        self.state.state()
    }

    fn lock(&self) -> Result<&R, LockError> {
        self.lock.get_or_try_init(|| match (self.init)() {
            Ok(lock) => {
                debug!("critical section lock initialized");
                Ok(lock)
            }
            Err(e) => {
                warn!("critical section lock construction failed: {e}");
                Err(e)
            }
        })
    }
}

impl<R: Default> LockPort<R> {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_init(default_lock::<R>)
    }
}

impl<R: Default> Default for LockPort<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> InterruptPort for LockPort<R>
where
    R: RawLock + RawUnlock,
{
    fn try_disable(&self) -> Result<CpuStatus, PortError> {
        let lock = self.lock()?;
        let me = HolderId::current().ok_or(PortError::StateCorrupted)?;
        if self.state.is_held_by(me) {
            trace!("interrupts already disabled by this flow");
            return Ok(CpuStatus::PLACEHOLDER);
        }

        lock.raw_lock()?;
        if !self.state.enter(me) {
            // SAFETY: acquired just above
            unsafe { lock.raw_unlock() };
            return Err(PortError::StateCorrupted);
        }
        trace!("interrupts disabled");
        Ok(CpuStatus::PLACEHOLDER)
    }

    fn try_restore(&self, _status: CpuStatus) -> Result<(), PortError> {
        let Some(lock) = self.lock.get() else {
            return Err(PortError::Uninitialized);
        };

        let me = HolderId::current().ok_or(PortError::StateCorrupted)?;
        if self.state.leave(me) {
            debug_assert!(lock.raw_is_locked(), "section left with the lock free");
            // SAFETY: the state machine only reaches Disabled while the lock is held
            unsafe { lock.raw_unlock() };
            trace!("interrupts restored");
        }
        Ok(())
    }

    fn is_held_by_caller(&self) -> bool {
        HolderId::current().is_some_and(|me| self.state.is_held_by(me))
    }
}
