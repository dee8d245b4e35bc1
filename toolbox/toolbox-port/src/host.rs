//! The process-wide port for hosted targets.
//!
//! An operating-system process cannot mask interrupts, so "disabling
//! interrupts" means taking [`HOST_PORT`]'s lock: every other thread that
//! tries to disable interrupts is suspended until the holder restores them.
//! The lock is created on the first call to [`interrupts_disable`] and lives
//! for the rest of the process.

use crate::{CpuStatus, InterruptPort, LockPort};
use toolbox_sync::RawBlocking;

pub type HostPort = LockPort<RawBlocking>;

pub static HOST_PORT: HostPort = HostPort::new();

/// Disables interrupts for the whole process. May block.
///
/// # Panics
/// Panics if the process-wide lock cannot be built or acquired.
#[track_caller]
pub fn interrupts_disable() -> CpuStatus {
    HOST_PORT.disable()
}

/// Restores the state captured by [`interrupts_disable`].
///
/// # Panics
/// Asserts if [`interrupts_disable`] was never called in this process.
#[track_caller]
pub fn interrupts_restore(status: CpuStatus) {
    HOST_PORT.restore(status);
}
