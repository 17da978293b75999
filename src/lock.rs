use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use lock_api::{GuardSend, RawMutex};

/// How long a sleeping waiter goes between checks of its signal. Raising a signal is not a
/// wakeup, so an interrupted waiter returns at most this long after the raise.
pub const SIGNAL_POLL: Duration = Duration::from_millis(1);

/// The cancellation context of a caller. Raising it aborts any interruptible wait the caller is
/// sleeping in, the way a pending signal aborts `mutex_lock_interruptible`.
#[derive(Debug, Clone, Default)]
pub struct Signal(Arc<AtomicBool>);

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A sleeping (not spinning) lock. Waiters block on a condition variable until the holder
/// releases it.
pub struct RawSleepLock {
    locked: Mutex<bool>,
    wake: Condvar,
}

impl RawSleepLock {
    fn state(&self) -> MutexGuard<'_, bool> {
        // the inner critical sections never panic, poisoning carries no information
        self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the lock unless `signal` is raised while the lock is contended. An uncontended
    /// lock is always acquired. Returns `false` if the wait was interrupted, within
    /// [`SIGNAL_POLL`] of the raise. A release wakes the waiter immediately.
    pub fn lock_interruptible(&self, signal: &Signal) -> bool {
        let mut locked = self.state();
        loop {
            if !*locked {
                *locked = true;
                return true;
            }

            if signal.is_pending() {
                return false;
            }

            locked = self
                .wake
                .wait_timeout(locked, SIGNAL_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

unsafe impl RawMutex for RawSleepLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        locked: Mutex::new(false),
        wake: Condvar::new(),
    };

    type GuardMarker = GuardSend;

    fn lock(&self) {
        let mut locked = self.state();
        while *locked {
            locked = self.wake.wait(locked).unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn try_lock(&self) -> bool {
        let mut locked = self.state();
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    unsafe fn unlock(&self) {
        *self.state() = false;
        self.wake.notify_one();
    }

    fn is_locked(&self) -> bool {
        *self.state()
    }
}

pub type SleepLock<T> = lock_api::Mutex<RawSleepLock, T>;
pub type SleepLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSleepLock, T>;

pub trait LockInterruptible<T> {
    /// Returns `None` if the caller's signal was raised while it waited for the lock.
    fn lock_interruptible(&self, signal: &Signal) -> Option<SleepLockGuard<'_, T>>;
}

impl<T> LockInterruptible<T> for SleepLock<T> {
    fn lock_interruptible(&self, signal: &Signal) -> Option<SleepLockGuard<'_, T>> {
        // SAFETY: the guard is only created once the raw lock is held by this caller, and the
        // guard is what releases it.
        unsafe {
            if self.raw().lock_interruptible(signal) {
                Some(self.make_guard_unchecked())
            } else {
                None
            }
        }
    }
}
