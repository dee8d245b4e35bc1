use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Whether a port currently considers interrupts disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionState {
    Enabled,
    Disabled,
}

/// Identifies a flow of control that may hold a port.
///
/// With `std` every thread gets its own id. Without it there is exactly one
/// flow of control, so every caller shares id 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct HolderId(NonZeroUsize);

impl HolderId {
    /// `None` once the calling thread's thread-locals are being torn down.
    #[cfg(feature = "std")]
    pub(crate) fn current() -> Option<Self> {
        std::thread_local! {
            static ID: HolderId = HolderId::next();
        }
        ID.try_with(|id| *id).ok()
    }

    #[cfg(not(feature = "std"))]
    #[allow(clippy::unnecessary_wraps)]
    pub(crate) const fn current() -> Option<Self> {
        Some(Self(NonZeroUsize::MIN))
    }

    #[cfg(feature = "std")]
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MAX))
    }

    const fn get(self) -> usize {
        self.0.get()
    }
}

/// The Enabled/Disabled state machine of a port.
///
/// * `0`: enabled
/// * `n > 0`: disabled, held by the flow with [`HolderId`] `n`
///
/// All transitions are compare-and-swap, so only the holder can leave the
/// Disabled state and only one flow can enter it.
pub(crate) struct SectionCell {
    holder: AtomicUsize,
}

const ENABLED: usize = 0;

impl SectionCell {
    pub(crate) const fn new() -> Self {
        Self {
            holder: AtomicUsize::new(ENABLED),
        }
    }

    pub(crate) fn state(&self) -> SectionState {
        if self.holder.load(Ordering::Acquire) == ENABLED {
            SectionState::Enabled
        } else {
            SectionState::Disabled
        }
    }

    /// Stable for the asking flow: only `id` itself can change the answer.
    pub(crate) fn is_held_by(&self, id: HolderId) -> bool {
        self.holder.load(Ordering::Acquire) == id.get()
    }

    /// Enabled -> Disabled. Returns `false` if the section was not enabled.
    pub(crate) fn enter(&self, id: HolderId) -> bool {
        self.holder
            .compare_exchange(ENABLED, id.get(), Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Disabled -> Enabled. Returns `false` if `id` was not the holder.
    pub(crate) fn leave(&self, id: HolderId) -> bool {
        self.holder
            .compare_exchange(id.get(), ENABLED, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        let cell = SectionCell::new();
        let me = HolderId::current().unwrap();
        assert_eq!(cell.state(), SectionState::Enabled);
        assert!(!cell.is_held_by(me));

        // leaving an enabled section changes nothing
        assert!(!cell.leave(me));
        assert_eq!(cell.state(), SectionState::Enabled);

        assert!(cell.enter(me));
        assert_eq!(cell.state(), SectionState::Disabled);
        assert!(cell.is_held_by(me));

        // a second enter cannot succeed while disabled
        assert!(!cell.enter(me));

        assert!(cell.leave(me));
        assert_eq!(cell.state(), SectionState::Enabled);
    }

    #[cfg(feature = "std")]
    #[test]
    fn threads_have_distinct_ids() {
        let here = HolderId::current().unwrap();
        assert_eq!(Some(here), HolderId::current());
        let there = std::thread::spawn(HolderId::current).join().unwrap();
        assert_ne!(Some(here), there);
    }

    #[cfg(feature = "std")]
    #[test]
    fn only_the_holder_can_leave() {
        let cell = SectionCell::new();
        let me = HolderId::current().unwrap();
        let other = std::thread::spawn(HolderId::current).join().unwrap().unwrap();

        assert!(cell.enter(me));
        assert!(!cell.is_held_by(other));
        assert!(!cell.leave(other));
        assert_eq!(cell.state(), SectionState::Disabled);
        assert!(cell.leave(me));
    }

    #[cfg(feature = "std")]
    #[test]
    fn asking_from_a_thread_local_destructor_does_not_panic() {
        struct AsksOnDrop(std::sync::mpsc::Sender<Option<HolderId>>);

        impl Drop for AsksOnDrop {
            fn drop(&mut self) {
                let _ = self.0.send(HolderId::current());
            }
        }

        std::thread_local! {
            static LATE: std::cell::RefCell<Option<AsksOnDrop>> = const { std::cell::RefCell::new(None) };
        }

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = HolderId::current();
            LATE.with(|late| *late.borrow_mut() = Some(AsksOnDrop(tx)));
        })
        .join()
        .unwrap();

        // either answer is fine; the call must not panic inside a destructor
        let _ = rx.recv().unwrap();
    }
}
