//! Joinable thread with timed join
//!
//! A `Thread` is either unstarted or joinable. Starting spawns a native
//! thread that runs the entry and then signals a completion event; joining
//! waits on that event (so it can time out) before reclaiming the native
//! handle.
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted --start--> Running --join(ok)--> Unstarted
//!                        |  ^
//!                        +--+ join(timeout) / second start (Err)
//! ```
//!
//! Dropping a running thread logs a warning and blocks until it finishes.

use core::fmt;
use std::sync::Arc;

use ddp_core::{dd_print, DdResult, LogLevel, ResultCode};
use ddp_hal::{truncate_name, Platform, StdPlatform, ThreadEntry, INFINITE_TIMEOUT};

use crate::sync::Event;

/// Signals completion when the entry returns or unwinds
struct SignalOnExit<P: Platform>(Arc<Event<P>>);

impl<P: Platform> Drop for SignalOnExit<P> {
    fn drop(&mut self) {
        self.0.signal();
    }
}

pub struct Thread<P: Platform = StdPlatform> {
    platform: P,
    native: Option<P::Thread>,
    done: Option<Arc<Event<P>>>,
    name: String,
}

impl Thread<StdPlatform> {
    pub fn new() -> Self {
        Self::new_in(StdPlatform)
    }
}

impl Default for Thread<StdPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Thread<P> {
    pub fn new_in(platform: P) -> Self {
        Self {
            platform,
            native: None,
            done: None,
            name: String::new(),
        }
    }

    /// Run `entry(param)` on a new native thread
    ///
    /// # Returns
    /// * `Err(ResultCode::Error)` - Already running, or the native spawn failed
    pub fn start<T: Send + 'static>(&mut self, entry: fn(T), param: T) -> DdResult {
        self.start_with(move || entry(param))
    }

    /// Run `body` on a new native thread
    pub fn start_with<F>(&mut self, body: F) -> DdResult
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_joinable() {
            tracing::debug!(name = %self.name, "start on a thread that is still joinable");
            return Err(ResultCode::Error);
        }

        let done = Arc::new(Event::new_in(false, self.platform.clone()));
        let signal = SignalOnExit(done.clone());
        let entry: ThreadEntry = Box::new(move || {
            let _signal = signal;
            body();
        });

        let native = self.platform.thread_spawn(entry)?;
        self.native = Some(native);
        self.done = Some(done);
        self.name.clear();
        Ok(())
    }

    /// Name the running thread from format arguments
    pub fn set_name(&mut self, args: fmt::Arguments<'_>) -> DdResult {
        match args.as_str() {
            Some(name) => self.set_name_raw(name),
            None => self.set_name_raw(&args.to_string()),
        }
    }

    /// Name the running thread, truncated to the platform limit
    ///
    /// The name is kept even when the entry has already returned; a thread
    /// that has exited has no native name left to change.
    ///
    /// # Returns
    /// * `Err(ResultCode::Error)` - The thread was never started
    pub fn set_name_raw(&mut self, name: &str) -> DdResult {
        let native = self.native.as_ref().ok_or(ResultCode::Error)?;
        let name = truncate_name(name, P::THREAD_NAME_MAX_LEN);
        self.name.clear();
        self.name.push_str(name);

        let exited = || self.done.as_ref().is_some_and(|done| done.is_signaled());
        if exited() {
            return Ok(());
        }
        match self.platform.thread_set_name(native, name) {
            // Lost the race with the entry returning.
            Err(_) if exited() => Ok(()),
            result => result,
        }
    }

    /// Last name applied, empty if none
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait up to `timeout_ms` for the thread to finish, then reclaim it
    ///
    /// # Returns
    /// * `Ok(())` - Joined, or there was nothing to join
    /// * `Err(ResultCode::NotReady)` - Timed out; the thread stays joinable
    /// * `Err(ResultCode::Aborted)` - The entry panicked; the thread is reclaimed
    pub fn join(&mut self, timeout_ms: u32) -> DdResult {
        let Some(native) = self.native.take() else {
            return Ok(());
        };
        if let Some(done) = &self.done {
            if let Err(code) = done.wait(timeout_ms) {
                self.native = Some(native);
                return Err(code);
            }
        }
        self.done = None;
        self.platform.thread_join(native)
    }

    pub fn is_joinable(&self) -> bool {
        self.native.is_some()
    }

    /// Move the native thread out, leaving an unstarted `Thread` behind
    pub fn take(&mut self) -> Self {
        Self {
            platform: self.platform.clone(),
            native: self.native.take(),
            done: self.done.take(),
            name: std::mem::take(&mut self.name),
        }
    }
}

impl<P: Platform> Drop for Thread<P> {
    fn drop(&mut self) {
        if !self.is_joinable() {
            return;
        }
        dd_print!(
            LogLevel::Warn,
            "Thread \"{}\" dropped while joinable; waiting for it to finish",
            self.name
        );
        if let Err(code) = self.join(INFINITE_TIMEOUT) {
            tracing::warn!(name = %self.name, %code, "implicit join failed");
        }
    }
}

impl<P: Platform> fmt::Debug for Thread<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("name", &self.name)
            .field("joinable", &self.is_joinable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn add_one(counter: Arc<AtomicU32>) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_start_and_join() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut thread = Thread::new();
        thread.start(add_one, counter.clone()).unwrap();
        assert!(thread.is_joinable());
        assert_eq!(thread.join(INFINITE_TIMEOUT), Ok(()));
        assert!(!thread.is_joinable());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_join_unstarted_is_noop() {
        let mut thread = Thread::new();
        assert_eq!(thread.join(0), Ok(()));
        assert_eq!(thread.join(INFINITE_TIMEOUT), Ok(()));
    }

    #[test]
    fn test_join_timeout_keeps_thread() {
        let gate = Arc::new(Event::new(false));
        let wait_on = gate.clone();
        let mut thread = Thread::new();
        thread
            .start_with(move || {
                let _ = wait_on.wait(INFINITE_TIMEOUT);
            })
            .unwrap();

        assert_eq!(thread.join(5), Err(ResultCode::NotReady));
        assert!(thread.is_joinable());

        gate.signal();
        assert_eq!(thread.join(INFINITE_TIMEOUT), Ok(()));
    }

    #[test]
    fn test_restart_after_join() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut thread = Thread::new();
        for _ in 0..3 {
            thread.start(add_one, counter.clone()).unwrap();
            thread.join(INFINITE_TIMEOUT).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_entry_reports_aborted() {
        let mut thread = Thread::new();
        thread.start_with(|| panic!("entry failed")).unwrap();
        assert_eq!(thread.join(INFINITE_TIMEOUT), Err(ResultCode::Aborted));
        assert!(!thread.is_joinable());
    }

    #[test]
    fn test_set_name_requires_start() {
        let mut thread = Thread::new();
        assert_eq!(thread.set_name_raw("idle"), Err(ResultCode::Error));
        assert_eq!(thread.name(), "");
    }

    #[test]
    fn test_set_name_after_entry_returned() {
        let finished = Arc::new(Event::new(false));
        let signal_on = finished.clone();
        let mut thread = Thread::new();
        thread.start_with(move || signal_on.signal()).unwrap();

        finished.wait(INFINITE_TIMEOUT).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));

        assert_eq!(thread.set_name_raw("late"), Ok(()));
        assert_eq!(thread.name(), "late");
        assert!(thread.is_joinable());
        assert_eq!(thread.join(INFINITE_TIMEOUT), Ok(()));
    }

    #[test]
    fn test_take_moves_ownership() {
        let mut thread = Thread::new();
        thread.start_with(|| {}).unwrap();
        let mut moved = thread.take();
        assert!(!thread.is_joinable());
        assert!(moved.is_joinable());
        assert_eq!(thread.join(0), Ok(()));
        assert_eq!(moved.join(INFINITE_TIMEOUT), Ok(()));
    }
}
