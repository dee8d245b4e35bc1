//! Process-wide assertion hook.
//!
//! Precondition violations in the toolbox (restoring interrupts through a port
//! whose lock was never built, leaving a critical section that was never
//! entered) are reported through [`fail`]. By default the failure panics. An
//! application may install its own [`AssertionHandler`], for example to log and
//! halt on a target without unwinding; if that handler returns, the offending
//! operation is skipped.
//!
//! With the `assertions` feature disabled, [`fail`] does nothing.

use core::fmt;
use core::panic::Location;
use core::sync::atomic::{AtomicPtr, Ordering};

pub type AssertionHandler = fn(&AssertionFailure<'_>);

/// Null means "use the default handler".
static HANDLER: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Details of a failed assertion.
pub struct AssertionFailure<'a> {
    message: &'a dyn fmt::Display,
    location: &'static Location<'static>,
}

impl AssertionFailure<'_> {
    #[must_use]
    pub fn message(&self) -> &dyn fmt::Display {
        self.message
    }

    /// Where the failing operation was called from.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for AssertionFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

impl fmt::Debug for AssertionFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionFailure")
            .field("message", &format_args!("{}", self.message))
            .field("location", &self.location)
            .finish()
    }
}

/// Installs `handler`, or the panicking default when `None`.
pub fn set_handler(handler: Option<AssertionHandler>) {
    let raw = handler.map_or(core::ptr::null_mut(), |h| h as *mut ());
    HANDLER.store(raw, Ordering::Release);
}

/// Reports a failed assertion to the installed handler.
///
/// # Panics
/// Panics when no custom handler is installed.
#[track_caller]
pub fn fail(message: &dyn fmt::Display) {
    if !cfg!(feature = "assertions") {
        return;
    }

    let failure = AssertionFailure {
        message,
        location: Location::caller(),
    };
    log::error!("assertion failed: {failure}");

    let raw = HANDLER.load(Ordering::Acquire);
    if raw.is_null() {
        panic!("assertion failed: {failure}");
    }

    // SAFETY: only `set_handler` stores non-null values, and those are `AssertionHandler`s.
    let handler = unsafe { core::mem::transmute::<*mut (), AssertionHandler>(raw) };
    handler(&failure);
}
