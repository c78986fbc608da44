//! std/OS backed implementation of `Platform`
//!
//! Locks, semaphores and events are built from `std::sync::Mutex` and
//! `Condvar`, which gives the happens-before edges between signaling and
//! waking threads. Threads use `std::thread`; renaming, library loading and
//! host queries go through `libc` on Unix.

mod library;
mod os;
mod sync;
mod thread;

use core::ffi::c_void;
use core::ptr::NonNull;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use ddp_core::{DdResult, LogLevel};

pub use library::StdLibrary;
pub use sync::{StdEvent, StdMutex, StdSemaphore};
pub use thread::StdThread;

use crate::{OsInfo, Platform, ThreadEntry};

/// Zero-sized provider for the host operating system
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StdPlatform;

impl StdPlatform {
    pub const fn new() -> Self {
        Self
    }
}

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

impl Platform for StdPlatform {
    type Mutex = StdMutex;
    type Semaphore = StdSemaphore;
    type Event = StdEvent;
    type Thread = StdThread;
    type Library = StdLibrary;

    const THREAD_NAME_MAX_LEN: usize = thread::NAME_MAX_LEN;

    fn mutex_create(&self) -> StdMutex {
        StdMutex::new()
    }

    fn mutex_lock(&self, mutex: &StdMutex) {
        mutex.lock();
    }

    fn mutex_try_lock(&self, mutex: &StdMutex) -> bool {
        mutex.try_lock()
    }

    unsafe fn mutex_unlock(&self, mutex: &StdMutex) {
        mutex.unlock();
    }

    fn semaphore_create(&self, initial: u32, max: u32) -> DdResult<StdSemaphore> {
        StdSemaphore::new(initial, max)
    }

    fn semaphore_signal(&self, semaphore: &StdSemaphore) -> DdResult {
        semaphore.signal()
    }

    fn semaphore_wait(&self, semaphore: &StdSemaphore, timeout_ms: u32) -> DdResult {
        semaphore.wait(timeout_ms)
    }

    fn semaphore_count(&self, semaphore: &StdSemaphore) -> u32 {
        semaphore.count()
    }

    fn event_create(&self, signaled: bool) -> StdEvent {
        StdEvent::new(signaled)
    }

    fn event_signal(&self, event: &StdEvent) {
        event.signal();
    }

    fn event_clear(&self, event: &StdEvent) {
        event.clear();
    }

    fn event_wait(&self, event: &StdEvent, timeout_ms: u32) -> DdResult {
        event.wait(timeout_ms)
    }

    fn event_is_signaled(&self, event: &StdEvent) -> bool {
        event.is_signaled()
    }

    fn thread_spawn(&self, entry: ThreadEntry) -> DdResult<StdThread> {
        StdThread::spawn(entry)
    }

    fn thread_join(&self, thread: StdThread) -> DdResult {
        thread.join()
    }

    fn thread_set_name(&self, thread: &StdThread, name: &str) -> DdResult {
        thread.set_name(name)
    }

    fn library_open(&self, name: &str) -> DdResult<StdLibrary> {
        StdLibrary::open(name)
    }

    fn library_symbol(&self, library: &StdLibrary, name: &str) -> Option<NonNull<c_void>> {
        library.symbol(name)
    }

    fn library_close(&self, library: StdLibrary) {
        library.close();
    }

    fn current_time_ms(&self) -> u64 {
        epoch().elapsed().as_millis() as u64
    }

    fn query_timestamp(&self) -> u64 {
        epoch().elapsed().as_nanos() as u64
    }

    fn query_timestamp_frequency(&self) -> u64 {
        1_000_000_000
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn yield_now(&self) {
        std::thread::yield_now();
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn process_name(&self) -> String {
        std::env::current_exe()
            .ok()
            .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| String::from("unknown"))
    }

    fn os_info(&self) -> DdResult<OsInfo> {
        os::query()
    }

    fn debug_write(&self, level: LogLevel, msg: &str) {
        // Best effort: a closed stderr must not take the caller down.
        let _ = writeln!(std::io::stderr().lock(), "[{}] {}", level, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_timestamp_is_monotonic() {
        let platform = StdPlatform::new();
        let a = platform.query_timestamp();
        platform.sleep_ms(2);
        let b = platform.query_timestamp();
        assert!(b > a);
        assert_eq!(platform.query_timestamp_frequency(), 1_000_000_000);
    }

    #[test]
    fn test_process_id_matches_std() {
        assert_eq!(StdPlatform.process_id(), std::process::id());
        assert!(!StdPlatform.process_name().is_empty());
    }

    #[test]
    fn test_os_info_reports_host() {
        let info = StdPlatform.os_info().unwrap();
        assert!(!info.os_type.is_empty());
        assert!(!info.description.is_empty());
        if cfg!(target_os = "linux") {
            assert!(info.physical_memory > 0);
        }
    }

    #[test]
    fn test_spawn_and_join() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let thread = StdPlatform
            .thread_spawn(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        assert_eq!(StdPlatform.thread_join(thread), Ok(()));
        assert!(ran.load(Ordering::SeqCst));
    }
}
