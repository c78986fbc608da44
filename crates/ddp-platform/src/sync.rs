//! Mutex, semaphore and event wrappers
//!
//! Each wrapper owns one native object from its provider and releases it on
//! drop. All three are `Send + Sync`; share them through `Arc` or by
//! reference across scoped threads.

use core::fmt;
use core::marker::PhantomData;

use ddp_core::DdResult;
use ddp_hal::{Platform, StdPlatform};

/// Non-reentrant mutual exclusion lock
///
/// Locking again on the thread that holds the lock deadlocks.
pub struct Mutex<P: Platform = StdPlatform> {
    platform: P,
    native: P::Mutex,
}

impl Mutex<StdPlatform> {
    pub fn new() -> Self {
        Self::new_in(StdPlatform)
    }
}

impl Default for Mutex<StdPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Mutex<P> {
    pub fn new_in(platform: P) -> Self {
        let native = platform.mutex_create();
        Self { platform, native }
    }

    /// Block until the lock is held; released when the guard drops
    pub fn lock(&self) -> MutexGuard<'_, P> {
        self.platform.mutex_lock(&self.native);
        MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        }
    }

    /// Acquire only if the lock is free
    pub fn try_lock(&self) -> Option<MutexGuard<'_, P>> {
        self.platform
            .mutex_try_lock(&self.native)
            .then(|| MutexGuard {
                mutex: self,
                _not_send: PhantomData,
            })
    }
}

impl<P: Platform> fmt::Debug for Mutex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").finish_non_exhaustive()
    }
}

/// Proof of holding a [`Mutex`]
#[must_use = "the mutex is unlocked when the guard is dropped"]
pub struct MutexGuard<'a, P: Platform = StdPlatform> {
    mutex: &'a Mutex<P>,
    // Unlock must happen on the locking thread.
    _not_send: PhantomData<*const ()>,
}

impl<P: Platform> Drop for MutexGuard<'_, P> {
    fn drop(&mut self) {
        // SAFETY: the guard only exists while this thread holds the mutex.
        unsafe { self.mutex.platform.mutex_unlock(&self.mutex.native) }
    }
}

impl<P: Platform> fmt::Debug for MutexGuard<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexGuard").finish_non_exhaustive()
    }
}

/// Counting semaphore with a maximum count
pub struct Semaphore<P: Platform = StdPlatform> {
    platform: P,
    native: P::Semaphore,
}

impl Semaphore<StdPlatform> {
    /// # Returns
    /// * `Err(ResultCode::InvalidParameter)` - `max == 0` or `initial > max`
    pub fn new(initial: u32, max: u32) -> DdResult<Self> {
        Self::new_in(initial, max, StdPlatform)
    }
}

impl<P: Platform> Semaphore<P> {
    pub fn new_in(initial: u32, max: u32, platform: P) -> DdResult<Self> {
        let native = platform.semaphore_create(initial, max)?;
        Ok(Self { platform, native })
    }

    /// Increment the count and wake one waiter
    ///
    /// # Returns
    /// * `Err(ResultCode::LimitReached)` - Already at the maximum; count unchanged
    pub fn signal(&self) -> DdResult {
        self.platform.semaphore_signal(&self.native)
    }

    /// Take one count, waiting up to `timeout_ms`
    ///
    /// # Returns
    /// * `Err(ResultCode::NotReady)` - Timed out; count unchanged
    pub fn wait(&self, timeout_ms: u32) -> DdResult {
        self.platform.semaphore_wait(&self.native, timeout_ms)
    }

    /// Snapshot of the count
    pub fn count(&self) -> u32 {
        self.platform.semaphore_count(&self.native)
    }
}

impl<P: Platform> fmt::Debug for Semaphore<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("count", &self.count())
            .finish()
    }
}

/// Manual-reset event
///
/// `signal` releases every waiter and the event stays set until `clear`.
pub struct Event<P: Platform = StdPlatform> {
    platform: P,
    native: P::Event,
}

impl Event<StdPlatform> {
    pub fn new(signaled: bool) -> Self {
        Self::new_in(signaled, StdPlatform)
    }
}

impl Default for Event<StdPlatform> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<P: Platform> Event<P> {
    pub fn new_in(signaled: bool, platform: P) -> Self {
        let native = platform.event_create(signaled);
        Self { platform, native }
    }

    pub fn signal(&self) {
        self.platform.event_signal(&self.native);
    }

    pub fn clear(&self) {
        self.platform.event_clear(&self.native);
    }

    /// # Returns
    /// * `Err(ResultCode::NotReady)` - Timed out
    pub fn wait(&self, timeout_ms: u32) -> DdResult {
        self.platform.event_wait(&self.native, timeout_ms)
    }

    pub fn is_signaled(&self) -> bool {
        self.platform.event_is_signaled(&self.native)
    }
}

impl<P: Platform> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("signaled", &self.is_signaled())
            .finish()
    }
}
