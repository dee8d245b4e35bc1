use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

/// 0 = UNINIT, 1 = INITING, 2 = READY
const UNINIT: u8 = 0;
const INITING: u8 = 1;
const READY: u8 = 2;

/// A cell written at most once, safe to share between threads.
///
/// The initializer runs on exactly one thread; the winner is decided by a
/// compare-and-swap on the state word. Concurrent callers wait until the value
/// is published. A failed fallible initializer returns the cell to its
/// uninitialized state so a later caller can try again; so does one that
/// panics.
///
/// The stored value is never dropped once published.
pub struct SyncOnceCell<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Default for SyncOnceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SyncOnceCell<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINIT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Returns `Some(&T)` if already initialized.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) == READY {
            // SAFETY: READY guarantees the write is done
            Some(unsafe { &*(*self.value.get()).as_ptr() })
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// Initialize at most once and return `&T`.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        match self.get_or_try_init(|| Ok::<T, core::convert::Infallible>(init())) {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    /// Initialize at most once with a fallible constructor and return `&T`.
    ///
    /// # Errors
    /// Returns the constructor's error. The cell stays uninitialized in that case.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        loop {
            // Fast path
            if let Some(v) = self.get() {
                return Ok(v);
            }

            // Try to take initialization
            if self
                .state
                .compare_exchange(UNINIT, INITING, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                // We are the initializer; a panicking `init` hands the cell back
                let reset = ResetOnUnwind(&self.state);
                let result = init();
                core::mem::forget(reset);

                return match result {
                    Ok(v) => {
                        unsafe {
                            (*self.value.get()).write(v);
                        }
                        // Publish value before marking READY
                        self.state.store(READY, Ordering::Release);
                        // SAFETY: just wrote it
                        Ok(unsafe { &*(*self.value.get()).as_ptr() })
                    }
                    Err(e) => {
                        self.state.store(UNINIT, Ordering::Release);
                        Err(e)
                    }
                };
            }

            // Someone else is initializing; wait until it either publishes or gives up
            while self.state.load(Ordering::Acquire) == INITING {
                spin_loop();
            }
        }
    }
}

/// Puts the state back to UNINIT unless forgotten.
struct ResetOnUnwind<'a>(&'a AtomicU8);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(UNINIT, Ordering::Release);
    }
}

// Safety: shared after READY; initialization is single-writer.
unsafe impl<T: Sync + Send> Sync for SyncOnceCell<T> {}
unsafe impl<T: Send> Send for SyncOnceCell<T> {}
