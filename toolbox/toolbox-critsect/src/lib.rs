//! # Critical sections
//!
//! Nestable critical sections on top of an [`InterruptPort`].
//!
//! A port's disable/restore pair does not count: disabling twice and
//! restoring once leaves interrupts enabled. [`CriticalSection`] adds the
//! nesting depth. Only the outermost [`CriticalSection::enter`] snapshots the
//! port's status and only the matching outermost [`CriticalSection::exit`]
//! hands it back, so library code may freely call into other code that opens
//! its own section.
//!
//! Data shared between threads lives in a [`Mutex`] from the
//! `critical_section` crate. Its borrow token can only come from
//! [`critical_section::with`], which (feature `critical-section-impl`) enters
//! the process-wide [`global`] section:
//!
//! ```
//! use core::cell::Cell;
//! use toolbox_critsect::{Mutex, global};
//!
//! static HITS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
//!
//! critical_section::with(|cs| {
//!     let hits = HITS.borrow(cs);
//!     hits.set(hits.get() + 1);
//!
//!     // nested sections are fine
//!     critical_section::with(|inner| HITS.borrow(inner).set(hits.get() + 1));
//!     assert_eq!(global::GLOBAL.nesting(), 1);
//! });
//! assert_eq!(critical_section::with(|cs| HITS.borrow(cs).get()), 2);
//! ```

#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "std")]
pub mod global;
mod section;

pub use critical_section::Mutex;
pub use section::{CriticalSection, CriticalSectionGuard};
pub use toolbox_port::{CpuStatus, InterruptPort};
