//! Busy-wait lock
//!
//! `AtomicLock` never parks the thread; it spins on a compare-exchange and
//! yields to the scheduler periodically. Hold it only for short sections.
//!
//! # Safety Invariants
//!
//! 1. **Mutual exclusion**: the 0 -> 1 transition is a single `Acquire` CAS
//! 2. **Publication**: `unlock` stores 0 with `Release`, so writes inside the
//!    section are visible to the next holder
//! 3. **No ownership tracking**: unlocking from a non-holder is a logic error,
//!    not checked

#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicU32, Ordering};
#[cfg(not(feature = "loom"))]
use core::sync::atomic::{AtomicU32, Ordering};

/// Spins between scheduler yields
pub const SPIN_YIELD_INTERVAL: u32 = 64;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Spin lock over a single atomic word
#[derive(Debug)]
pub struct AtomicLock {
    state: AtomicU32,
}

impl AtomicLock {
    #[cfg(not(feature = "loom"))]
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    // loom atomics are not const-constructible.
    #[cfg(feature = "loom")]
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Spin until the lock is acquired
    pub fn lock(&self) {
        let mut spins: u32 = 0;
        while !self.try_lock() {
            // Wait on a plain load to keep the cache line shared while contended.
            while self.is_locked() {
                spins = spins.wrapping_add(1);
                if spins % SPIN_YIELD_INTERVAL == 0 {
                    yield_now();
                } else {
                    spin_hint();
                }
            }
        }
    }

    /// Single acquisition attempt; fails only if the lock is held
    pub fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn unlock(&self) {
        self.state.store(UNLOCKED, Ordering::Release);
    }

    /// Snapshot; may be stale by the time it is read
    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) == LOCKED
    }

    /// Lock and release on drop
    pub fn guard(&self) -> AtomicLockGuard<'_> {
        self.lock();
        AtomicLockGuard { lock: self }
    }
}

impl Default for AtomicLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "loom")]
fn yield_now() {
    loom::thread::yield_now();
}

#[cfg(not(feature = "loom"))]
fn yield_now() {
    std::thread::yield_now();
}

// loom cannot make progress through a pure busy loop; every spin must yield.
#[cfg(feature = "loom")]
fn spin_hint() {
    loom::thread::yield_now();
}

#[cfg(not(feature = "loom"))]
fn spin_hint() {
    core::hint::spin_loop();
}

/// Scope guard returned by [`AtomicLock::guard`]
#[must_use = "the lock is released when the guard is dropped"]
#[derive(Debug)]
pub struct AtomicLockGuard<'a> {
    lock: &'a AtomicLock,
}

impl Drop for AtomicLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
