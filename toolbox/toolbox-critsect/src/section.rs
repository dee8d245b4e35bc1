use core::marker::PhantomData;
use core::sync::atomic::{AtomicUsize, Ordering};
use log::trace;
use toolbox_port::{CpuStatus, InterruptPort, assert};

/// A nestable critical section over the port `P`.
///
/// The nesting depth and the saved status are only touched while the port is
/// disabled, so the port itself serializes access to them.
pub struct CriticalSection<P> {
    port: P,
    nesting: AtomicUsize,
    saved: AtomicUsize,
}

impl<P> CriticalSection<P> {
    #[must_use]
    pub const fn new(port: P) -> Self {
        Self {
            port,
            nesting: AtomicUsize::new(0),
            saved: AtomicUsize::new(0),
        }
    }

    /// Current nesting depth; `0` outside of any section.
    #[must_use]
    pub fn nesting(&self) -> usize {
        self.nesting.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn port(&self) -> &P {
        &self.port
    }
}

impl<P: InterruptPort> CriticalSection<P> {
    /// Enters the section, blocking other flows of control until the
    /// matching outermost [`CriticalSection::exit`].
    ///
    /// # Panics
    /// Panics if the port cannot disable interrupts.
    #[track_caller]
    pub fn enter(&self) {
        let status = self.port.disable();
        let depth = self.nesting.load(Ordering::Relaxed);
        if depth == 0 {
            self.saved.store(status.into_raw(), Ordering::Relaxed);
            trace!("critical section entered");
        }
        self.nesting.store(depth + 1, Ordering::Relaxed);
    }

    /// Leaves one level of the section.
    ///
    /// # Panics
    /// Leaving a section that the caller never entered is reported to
    /// [`assert::fail`], which panics unless a custom handler is installed.
    /// The section is left untouched in that case.
    #[track_caller]
    pub fn exit(&self) {
        // the depth belongs to whoever holds the port
        if !self.port.is_held_by_caller() {
            assert::fail(&"critical section exited without being entered");
            return;
        }

        let depth = self.nesting.load(Ordering::Relaxed);
        if depth == 0 {
            assert::fail(&"critical section exited without being entered");
            return;
        }

        self.nesting.store(depth - 1, Ordering::Relaxed);
        if depth == 1 {
            let status = CpuStatus::from_raw(self.saved.load(Ordering::Relaxed));
            trace!("critical section left");
            self.port.restore(status);
        }
    }

    /// Enters the section for the lifetime of the returned guard.
    #[track_caller]
    pub fn lock(&self) -> CriticalSectionGuard<'_, P> {
        self.enter();
        CriticalSectionGuard {
            section: self,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` inside the section.
    pub fn with<R>(&self, f: impl FnOnce(&CriticalSectionGuard<'_, P>) -> R) -> R {
        let guard = self.lock();
        f(&guard)
    }
}

/// Proof that a [`CriticalSection`] is entered; leaves it on drop.
///
/// Not `Send`: a section must be left by the flow that entered it.
#[must_use = "the section is left as soon as the guard is dropped"]
pub struct CriticalSectionGuard<'a, P: InterruptPort> {
    section: &'a CriticalSection<P>,
    _not_send: PhantomData<*const ()>,
}

impl<P: InterruptPort> CriticalSectionGuard<'_, P> {
    #[must_use]
    pub fn nesting(&self) -> usize {
        self.section.nesting()
    }
}

impl<P: InterruptPort> Drop for CriticalSectionGuard<'_, P> {
    fn drop(&mut self) {
        self.section.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;
    use toolbox_port::{LockPort, PortError, SectionState};
    use toolbox_sync::RawSpin;

    /// Hands out increasing statuses and remembers what it got back.
    #[derive(Default)]
    struct RecordingPort {
        disables: AtomicUsize,
        restores: AtomicUsize,
        restored: AtomicUsize,
    }

    impl InterruptPort for RecordingPort {
        fn try_disable(&self) -> Result<CpuStatus, PortError> {
            let n = self.disables.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CpuStatus::from_raw(n * 10))
        }

        fn try_restore(&self, status: CpuStatus) -> Result<(), PortError> {
            self.restores.fetch_add(1, Ordering::SeqCst);
            self.restored.store(status.into_raw(), Ordering::SeqCst);
            Ok(())
        }
    }

    impl RecordingPort {
        fn counts(&self) -> (usize, usize) {
            (
                self.disables.load(Ordering::SeqCst),
                self.restores.load(Ordering::SeqCst),
            )
        }
    }

    #[test]
    fn outermost_exit_restores_first_status() {
        let cs = CriticalSection::new(RecordingPort::default());
        cs.enter();
        cs.enter();
        cs.enter();
        assert_eq!(cs.nesting(), 3);
        assert_eq!(cs.port().counts(), (3, 0));

        cs.exit();
        cs.exit();
        assert_eq!(cs.nesting(), 1);
        assert_eq!(cs.port().counts(), (3, 0));

        cs.exit();
        assert_eq!(cs.nesting(), 0);
        assert_eq!(cs.port().counts(), (3, 1));
        assert_eq!(cs.port().restored.load(Ordering::SeqCst), 10);
    }

    #[test]
    #[should_panic(expected = "exited without being entered")]
    fn exit_without_enter_asserts() {
        let cs = CriticalSection::new(RecordingPort::default());
        cs.exit();
    }

    #[test]
    fn exit_without_enter_leaves_port_alone() {
        let cs = CriticalSection::new(RecordingPort::default());
        let res = panic::catch_unwind(panic::AssertUnwindSafe(|| cs.exit()));
        assert!(res.is_err());
        assert_eq!(cs.nesting(), 0);
        assert_eq!(cs.port().counts(), (0, 0));

        // still usable afterwards
        cs.enter();
        cs.exit();
        assert_eq!(cs.port().counts(), (1, 1));
    }

    #[test]
    fn exit_from_another_thread_is_refused() {
        static CS: CriticalSection<LockPort<RawSpin>> = CriticalSection::new(LockPort::new());

        CS.enter();
        let foreign = std::thread::spawn(|| CS.exit()).join();
        assert!(foreign.is_err(), "foreign exit must assert");

        // the holder's section is intact
        assert_eq!(CS.nesting(), 1);
        assert_eq!(CS.port().state(), SectionState::Disabled);

        CS.exit();
        assert_eq!(CS.nesting(), 0);
        assert_eq!(CS.port().state(), SectionState::Enabled);

        // and the port is free for the next thread
        let depth = std::thread::spawn(|| CS.with(|g| g.nesting()))
            .join()
            .unwrap();
        assert_eq!(depth, 1);
    }

    #[test]
    fn exit_while_another_thread_holds_the_section_keeps_it_held() {
        static CS: CriticalSection<LockPort<RawSpin>> = CriticalSection::new(LockPort::new());

        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (leave_tx, leave_rx) = std::sync::mpsc::channel::<()>();
        let holder = std::thread::spawn(move || {
            CS.with(|_| {
                entered_tx.send(()).unwrap();
                leave_rx.recv().unwrap();
            });
        });
        entered_rx.recv().unwrap();

        let res = panic::catch_unwind(|| CS.exit());
        assert!(res.is_err());
        assert_eq!(CS.nesting(), 1);
        assert_eq!(CS.port().state(), SectionState::Disabled);

        leave_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(CS.port().state(), SectionState::Enabled);
    }

    #[test]
    fn guard_leaves_on_drop() {
        let cs = CriticalSection::new(RecordingPort::default());
        {
            let outer = cs.lock();
            assert_eq!(outer.nesting(), 1);
            {
                let inner = cs.lock();
                assert_eq!(inner.nesting(), 2);
            }
            assert_eq!(cs.nesting(), 1);
            assert_eq!(cs.port().counts(), (2, 0));
        }
        assert_eq!(cs.nesting(), 0);
        assert_eq!(cs.port().counts(), (2, 1));
    }

    #[test]
    fn guard_leaves_on_panic() {
        let cs = CriticalSection::new(RecordingPort::default());
        let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let _: u32 = cs.with(|_| panic!("boom"));
        }));
        assert!(res.is_err(), "expected panic");
        assert_eq!(cs.nesting(), 0);
        assert_eq!(cs.port().counts(), (1, 1));
    }

    #[test]
    fn with_returns_closure_value() {
        let cs = CriticalSection::new(RecordingPort::default());
        let depth = cs.with(|g| g.nesting());
        assert_eq!(depth, 1);
        assert_eq!(cs.nesting(), 0);
    }

    #[test]
    fn works_through_a_port_reference() {
        let port = RecordingPort::default();
        let cs = CriticalSection::new(&port);
        cs.with(|_| ());
        assert_eq!(port.counts(), (1, 1));
    }
}
