//! Mock Platform implementation for testing the driver platform layer
//!
//! `MockPlatform` runs real threads and real locks (it delegates to
//! `StdPlatform`) but records what the wrappers ask of the provider, so tests
//! can count native spawns and joins, inspect thread names and debug output,
//! inject spawn failures and load fake libraries without touching the disk.
//! Host queries return fixed values.

use core::ffi::c_void;
use core::ptr::NonNull;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ddp_core::{DdResult, LogLevel, ResultCode};
use ddp_hal::std_platform::{StdEvent, StdMutex, StdSemaphore, StdThread};
use ddp_hal::{OsInfo, Platform, StdPlatform, ThreadEntry};

/// Names are kept short so truncation paths are easy to hit in tests
pub const MOCK_THREAD_NAME_MAX_LEN: usize = 15;

/// Process id reported by the mock
pub const MOCK_PROCESS_ID: u32 = 4242;

/// Hostname reported by the mock's `os_info`
pub const MOCK_HOSTNAME: &str = "mock-host";

/// Mock provider for unit testing
///
/// Clones share one state, so a clone handed to a wrapper reports into the
/// same counters the test reads.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    spawn_count: AtomicUsize,
    join_count: AtomicUsize,
    fail_next_spawn: AtomicBool,
    /// Names applied through `thread_set_name`, in call order
    thread_names: Mutex<Vec<String>>,
    /// Captured `debug_write` lines as "[level] msg"
    debug_log: Mutex<Vec<String>>,
    /// Fake libraries: name -> (symbol -> address)
    libraries: Mutex<HashMap<String, HashMap<String, usize>>>,
    open_libraries: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native threads spawned so far
    pub fn spawn_count(&self) -> usize {
        self.state.spawn_count.load(Ordering::SeqCst)
    }

    /// Native threads joined so far
    pub fn join_count(&self) -> usize {
        self.state.join_count.load(Ordering::SeqCst)
    }

    /// Make the next `thread_spawn` fail with `Error`
    pub fn fail_next_spawn(&self) {
        self.state.fail_next_spawn.store(true, Ordering::SeqCst);
    }

    pub fn thread_names(&self) -> Vec<String> {
        lock(&self.state.thread_names).clone()
    }

    /// Get all captured debug messages
    pub fn get_debug_log(&self) -> Vec<String> {
        lock(&self.state.debug_log).clone()
    }

    pub fn clear_debug_log(&self) {
        lock(&self.state.debug_log).clear();
    }

    /// Check if a specific message was logged
    pub fn has_log_containing(&self, substr: &str) -> bool {
        lock(&self.state.debug_log)
            .iter()
            .any(|msg| msg.contains(substr))
    }

    /// Make `name` loadable, exposing `symbols` at the given addresses
    pub fn register_library(&self, name: &str, symbols: &[(&str, NonNull<c_void>)]) {
        let symbols = symbols
            .iter()
            .map(|(sym, addr)| (String::from(*sym), addr.as_ptr() as usize))
            .collect();
        lock(&self.state.libraries).insert(String::from(name), symbols);
    }

    /// Libraries opened and not yet closed
    pub fn open_library_count(&self) -> usize {
        self.state.open_libraries.load(Ordering::SeqCst)
    }
}

impl core::fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockPlatform")
            .field("spawn_count", &self.spawn_count())
            .field("join_count", &self.join_count())
            .field("open_libraries", &self.open_library_count())
            .finish()
    }
}

/// Fake loaded module
#[derive(Debug)]
pub struct MockLibrary {
    name: String,
    symbols: HashMap<String, usize>,
}

impl MockLibrary {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Platform for MockPlatform {
    type Mutex = StdMutex;
    type Semaphore = StdSemaphore;
    type Event = StdEvent;
    type Thread = StdThread;
    type Library = MockLibrary;

    const THREAD_NAME_MAX_LEN: usize = MOCK_THREAD_NAME_MAX_LEN;

    fn mutex_create(&self) -> StdMutex {
        StdPlatform.mutex_create()
    }

    fn mutex_lock(&self, mutex: &StdMutex) {
        StdPlatform.mutex_lock(mutex);
    }

    fn mutex_try_lock(&self, mutex: &StdMutex) -> bool {
        StdPlatform.mutex_try_lock(mutex)
    }

    unsafe fn mutex_unlock(&self, mutex: &StdMutex) {
        // SAFETY: forwarded caller contract.
        unsafe { StdPlatform.mutex_unlock(mutex) }
    }

    fn semaphore_create(&self, initial: u32, max: u32) -> DdResult<StdSemaphore> {
        StdPlatform.semaphore_create(initial, max)
    }

    fn semaphore_signal(&self, semaphore: &StdSemaphore) -> DdResult {
        StdPlatform.semaphore_signal(semaphore)
    }

    fn semaphore_wait(&self, semaphore: &StdSemaphore, timeout_ms: u32) -> DdResult {
        StdPlatform.semaphore_wait(semaphore, timeout_ms)
    }

    fn semaphore_count(&self, semaphore: &StdSemaphore) -> u32 {
        StdPlatform.semaphore_count(semaphore)
    }

    fn event_create(&self, signaled: bool) -> StdEvent {
        StdPlatform.event_create(signaled)
    }

    fn event_signal(&self, event: &StdEvent) {
        StdPlatform.event_signal(event);
    }

    fn event_clear(&self, event: &StdEvent) {
        StdPlatform.event_clear(event);
    }

    fn event_wait(&self, event: &StdEvent, timeout_ms: u32) -> DdResult {
        StdPlatform.event_wait(event, timeout_ms)
    }

    fn event_is_signaled(&self, event: &StdEvent) -> bool {
        StdPlatform.event_is_signaled(event)
    }

    fn thread_spawn(&self, entry: ThreadEntry) -> DdResult<StdThread> {
        if self.state.fail_next_spawn.swap(false, Ordering::SeqCst) {
            return Err(ResultCode::Error);
        }
        let thread = StdPlatform.thread_spawn(entry)?;
        self.state.spawn_count.fetch_add(1, Ordering::SeqCst);
        Ok(thread)
    }

    fn thread_join(&self, thread: StdThread) -> DdResult {
        let result = StdPlatform.thread_join(thread);
        self.state.join_count.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn thread_set_name(&self, _thread: &StdThread, name: &str) -> DdResult {
        lock(&self.state.thread_names).push(String::from(name));
        Ok(())
    }

    fn library_open(&self, name: &str) -> DdResult<MockLibrary> {
        let symbols = lock(&self.state.libraries)
            .get(name)
            .cloned()
            .ok_or(ResultCode::FileNotFound)?;
        self.state.open_libraries.fetch_add(1, Ordering::SeqCst);
        Ok(MockLibrary {
            name: String::from(name),
            symbols,
        })
    }

    fn library_symbol(&self, library: &MockLibrary, name: &str) -> Option<NonNull<c_void>> {
        library
            .symbols
            .get(name)
            .and_then(|&addr| NonNull::new(addr as *mut c_void))
    }

    fn library_close(&self, _library: MockLibrary) {
        self.state.open_libraries.fetch_sub(1, Ordering::SeqCst);
    }

    fn current_time_ms(&self) -> u64 {
        StdPlatform.current_time_ms()
    }

    fn query_timestamp(&self) -> u64 {
        StdPlatform.query_timestamp()
    }

    fn query_timestamp_frequency(&self) -> u64 {
        StdPlatform.query_timestamp_frequency()
    }

    fn sleep_ms(&self, ms: u32) {
        StdPlatform.sleep_ms(ms);
    }

    fn yield_now(&self) {
        StdPlatform.yield_now();
    }

    fn process_id(&self) -> u32 {
        MOCK_PROCESS_ID
    }

    fn process_name(&self) -> String {
        String::from("mock-process")
    }

    fn os_info(&self) -> DdResult<OsInfo> {
        Ok(OsInfo {
            os_type: String::from("Linux"),
            name: String::from("Mock Linux 1.0"),
            description: String::from("Mock Linux 1.0 x86_64"),
            hostname: String::from(MOCK_HOSTNAME),
            user_name: String::from("mock-user"),
            home_dir: String::from("/home/mock-user"),
            physical_memory: 16 << 30,
            swap_memory: 2 << 30,
        })
    }

    fn debug_write(&self, level: LogLevel, msg: &str) {
        lock(&self.state.debug_log).push(format!("[{}] {}", level, msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn answer() -> i32 {
        42
    }

    fn answer_ptr() -> NonNull<c_void> {
        NonNull::new(answer as *mut c_void).unwrap()
    }

    #[test]
    fn test_mock_debug_log() {
        let platform = MockPlatform::new();
        platform.debug_write(LogLevel::Info, "Hello");
        platform.debug_write(LogLevel::Error, "World");

        let log = platform.get_debug_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], "[info] Hello");
        assert!(platform.has_log_containing("World"));
        assert!(!platform.has_log_containing("Foo"));

        platform.clear_debug_log();
        assert!(platform.get_debug_log().is_empty());
    }

    #[test]
    fn test_mock_spawn_counts_and_failure() {
        let platform = MockPlatform::new();
        let thread = platform.thread_spawn(Box::new(|| {})).unwrap();
        platform.thread_join(thread).unwrap();
        assert_eq!(platform.spawn_count(), 1);
        assert_eq!(platform.join_count(), 1);

        platform.fail_next_spawn();
        assert_eq!(
            platform.thread_spawn(Box::new(|| {})).unwrap_err(),
            ResultCode::Error
        );
        assert_eq!(platform.spawn_count(), 1);
    }

    #[test]
    fn test_mock_clones_share_state() {
        let platform = MockPlatform::new();
        let clone = platform.clone();
        clone.debug_write(LogLevel::Warn, "from clone");
        assert!(platform.has_log_containing("from clone"));
    }

    #[test]
    fn test_mock_os_info_is_fixed() {
        let info = MockPlatform::new().os_info().unwrap();
        assert_eq!(info.hostname, MOCK_HOSTNAME);
        assert_eq!(info.os_type, "Linux");
        assert_eq!(info.physical_memory, 16 << 30);
        assert_eq!(info, MockPlatform::new().os_info().unwrap());
    }

    #[test]
    fn test_mock_libraries() {
        let platform = MockPlatform::new();
        assert_eq!(
            platform.library_open("libmissing.so").unwrap_err(),
            ResultCode::FileNotFound
        );

        platform.register_library("libanswer.so", &[("answer", answer_ptr())]);
        let library = platform.library_open("libanswer.so").unwrap();
        assert_eq!(library.name(), "libanswer.so");
        assert_eq!(platform.open_library_count(), 1);
        assert_eq!(platform.library_symbol(&library, "answer"), Some(answer_ptr()));
        assert!(platform.library_symbol(&library, "question").is_none());

        platform.library_close(library);
        assert_eq!(platform.open_library_count(), 0);
    }
}
