//! The process-wide critical section, backed by [`HOST_PORT`].
//!
//! With the `critical-section-impl` feature this is also the section behind
//! [`critical_section::with`], so [`critical_section::Mutex`] data is
//! protected against [`enter`], [`lock`] and [`with`] users alike.

use crate::{CriticalSection, CriticalSectionGuard};
use toolbox_port::host::{HOST_PORT, HostPort};

pub type GlobalSection = CriticalSection<&'static HostPort>;

pub static GLOBAL: GlobalSection = CriticalSection::new(&HOST_PORT);

/// Enters the process-wide section. May block.
#[track_caller]
pub fn enter() {
    GLOBAL.enter();
}

/// Leaves one level of the process-wide section.
#[track_caller]
pub fn exit() {
    GLOBAL.exit();
}

#[track_caller]
pub fn lock() -> CriticalSectionGuard<'static, &'static HostPort> {
    GLOBAL.lock()
}

/// Runs `f` inside the process-wide section.
pub fn with<R>(f: impl FnOnce(&CriticalSectionGuard<'_, &'static HostPort>) -> R) -> R {
    GLOBAL.with(f)
}

/// [`critical_section::Impl`] over [`GLOBAL`].
///
/// The restore state is the nesting depth reached by `acquire`; releases have
/// to come back in reverse order.
#[cfg(feature = "critical-section-impl")]
pub struct GlobalCriticalSection;

#[cfg(feature = "critical-section-impl")]
unsafe impl critical_section::Impl for GlobalCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        GLOBAL.enter();
        GLOBAL.nesting()
    }

    unsafe fn release(depth: critical_section::RawRestoreState) {
        debug_assert_eq!(
            GLOBAL.nesting(),
            depth,
            "critical sections released out of order"
        );
        GLOBAL.exit();
    }
}

#[cfg(feature = "critical-section-impl")]
#[allow(clippy::no_mangle_with_rust_abi)]
mod set_impl {
    critical_section::set_impl!(super::GlobalCriticalSection);
}
