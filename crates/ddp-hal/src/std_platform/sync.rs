//! Mutex, semaphore and event over `std::sync::{Mutex, Condvar}`

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ddp_core::{DdResult, ResultCode};

use crate::INFINITE_TIMEOUT;

// Inner state is never left inconsistent by a panic, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Block while `condition` holds, for at most `timeout_ms`
fn wait_while<'a, T>(
    cvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout_ms: u32,
    condition: impl FnMut(&mut T) -> bool,
) -> MutexGuard<'a, T> {
    if timeout_ms == INFINITE_TIMEOUT {
        cvar.wait_while(guard, condition)
            .unwrap_or_else(PoisonError::into_inner)
    } else {
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, condition)
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }
}

/// Non-reentrant lock with explicit lock/unlock
#[derive(Debug, Default)]
pub struct StdMutex {
    locked: Mutex<bool>,
    cvar: Condvar,
}

impl StdMutex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) {
        let mut locked = wait_while(&self.cvar, lock(&self.locked), INFINITE_TIMEOUT, |l| *l);
        *locked = true;
    }

    pub fn try_lock(&self) -> bool {
        let mut locked = lock(&self.locked);
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    pub fn unlock(&self) {
        *lock(&self.locked) = false;
        self.cvar.notify_one();
    }
}

#[derive(Debug)]
struct SemaphoreState {
    count: u32,
    max: u32,
}

/// Counting semaphore bounded by a maximum count
#[derive(Debug)]
pub struct StdSemaphore {
    state: Mutex<SemaphoreState>,
    cvar: Condvar,
}

impl StdSemaphore {
    pub fn new(initial: u32, max: u32) -> DdResult<Self> {
        if max == 0 || initial > max {
            return Err(ResultCode::InvalidParameter);
        }
        Ok(Self {
            state: Mutex::new(SemaphoreState {
                count: initial,
                max,
            }),
            cvar: Condvar::new(),
        })
    }

    pub fn signal(&self) -> DdResult {
        let mut state = lock(&self.state);
        if state.count >= state.max {
            return Err(ResultCode::LimitReached);
        }
        state.count += 1;
        drop(state);
        self.cvar.notify_one();
        Ok(())
    }

    pub fn wait(&self, timeout_ms: u32) -> DdResult {
        let mut state = wait_while(&self.cvar, lock(&self.state), timeout_ms, |s| s.count == 0);
        if state.count == 0 {
            return Err(ResultCode::NotReady);
        }
        state.count -= 1;
        Ok(())
    }

    pub fn count(&self) -> u32 {
        lock(&self.state).count
    }
}

/// Manual-reset event
#[derive(Debug, Default)]
pub struct StdEvent {
    signaled: Mutex<bool>,
    cvar: Condvar,
}

impl StdEvent {
    pub fn new(signaled: bool) -> Self {
        Self {
            signaled: Mutex::new(signaled),
            cvar: Condvar::new(),
        }
    }

    pub fn signal(&self) {
        *lock(&self.signaled) = true;
        self.cvar.notify_all();
    }

    pub fn clear(&self) {
        *lock(&self.signaled) = false;
    }

    pub fn wait(&self, timeout_ms: u32) -> DdResult {
        let signaled = wait_while(&self.cvar, lock(&self.signaled), timeout_ms, |s| !*s);
        if *signaled {
            Ok(())
        } else {
            Err(ResultCode::NotReady)
        }
    }

    pub fn is_signaled(&self) -> bool {
        *lock(&self.signaled)
    }
}
