//! Interrupt port for `x86_64` processors.
//!
//! [`X86Port::try_disable`] snapshots `RFLAGS` and executes `cli` if the
//! interrupt flag (`IF`, bit 9) was set. [`X86Port::try_restore`] executes
//! `sti` **only** if the snapshot had `IF` set, so nested disable/restore pairs
//! leave interrupts masked until the outermost restore.
//!
//! # Safety & Privilege
//!
//! `cli`/`sti` are only legal in ring 0 (or a suitable hypervisor context).
//! Using this port from user space faults.
//!
//! ```no_run
//! use toolbox_port::InterruptPort;
//! use toolbox_port::x86::X86Port;
//!
//! let status = X86Port.disable();
//! // interrupts are masked here
//! X86Port.restore(status);
//! ```

use crate::{CpuStatus, InterruptPort, PortError};

/// Interrupt flag in `RFLAGS`.
const RFLAGS_IF: usize = 1 << 9;

/// Disables hardware interrupts (`cli`).
#[inline]
fn cli_stop_interrupts() {
    unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
}

/// Enables hardware interrupts (`sti`).
#[inline]
fn sti_enable_interrupts() {
    unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
}

/// Returns the current `RFLAGS` value (via `pushfq/pop`).
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nostack, preserves_flags)) }
    r
}

/// Whether interrupts were enabled when `status` was captured.
#[inline]
#[must_use]
pub const fn interrupts_were_enabled(status: CpuStatus) -> bool {
    status.into_raw() & RFLAGS_IF != 0
}

/// The hardware port. Stateless; the status token carries the saved `RFLAGS`.
#[derive(Debug, Default, Copy, Clone)]
pub struct X86Port;

impl InterruptPort for X86Port {
    #[allow(clippy::cast_possible_truncation)]
    fn try_disable(&self) -> Result<CpuStatus, PortError> {
        // usize is 64 bits wide on x86_64
        let status = CpuStatus::from_raw(rflags() as usize);
        if interrupts_were_enabled(status) {
            cli_stop_interrupts();
        }
        Ok(status)
    }

    fn try_restore(&self, status: CpuStatus) -> Result<(), PortError> {
        if interrupts_were_enabled(status) {
            sti_enable_interrupts();
        }
        Ok(())
    }
}
