//! Native provider trait for the driver platform layer
//!
//! This crate defines the `Platform` trait that lets the synchronization,
//! thread and library wrappers run on different operating systems by
//! abstracting the native primitives they are built on.
//!
//! # Platform Implementations
//!
//! - **std**: `std::sync` mutex/condvar pairs for locks, semaphores and events,
//!   `std::thread` for threads, `pthread_setname_np` and `dlopen` via `libc` on Unix
//! - **mock**: `ddp-hal-mock`, an instrumented wrapper used by tests

use core::ffi::c_void;
use core::ptr::NonNull;

pub use ddp_core::{DdResult, LogLevel, ResultCode};

pub mod std_platform;

pub use std_platform::StdPlatform;

/// Timeout value that waits without bound
pub const INFINITE_TIMEOUT: u32 = u32::MAX;

/// Body run by a native thread
pub type ThreadEntry = Box<dyn FnOnce() + Send + 'static>;

/// Host and user description reported by [`Platform::os_info`]
///
/// Fields the host cannot report are left empty or zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OsInfo {
    /// OS family: "Linux", "Darwin" or "Windows"
    pub os_type: String,
    /// Short version string, e.g. "Ubuntu 24.04.1 LTS"
    pub name: String,
    /// Detailed version string
    pub description: String,
    pub hostname: String,
    pub user_name: String,
    pub home_dir: String,
    /// Total physical memory in bytes
    pub physical_memory: u64,
    /// Total swap in bytes
    pub swap_memory: u64,
}

/// Native provider trait
///
/// Implementations provide the OS-specific functionality for:
/// - Mutexes (non-reentrant, lock/unlock without guards)
/// - Counting semaphores with a maximum count
/// - Manual-reset events
/// - Threads (spawn, join, rename)
/// - Dynamic libraries (open, symbol lookup, close)
/// - Time, sleeping, process and host identity, debug output
///
/// # Associated Types
///
/// Each handle type owns exactly one native resource and releases it on
/// drop, except `Library`, which is released through `library_close`.
///
/// # Cloning
///
/// Wrappers store a clone of the provider next to every handle, so clones
/// must be cheap and must all refer to the same underlying platform.
pub trait Platform: Clone + Send + Sync + 'static {
    /// Native mutex
    type Mutex: Send + Sync;
    /// Native counting semaphore
    type Semaphore: Send + Sync;
    /// Native manual-reset event
    type Event: Send + Sync;
    /// Native thread handle (joinable)
    type Thread: Send;
    /// Native loaded module
    type Library: Send + Sync;

    /// Maximum thread name length in bytes, excluding any terminator
    const THREAD_NAME_MAX_LEN: usize;

    // === Mutex ===

    fn mutex_create(&self) -> Self::Mutex;

    /// Block until the mutex is acquired
    fn mutex_lock(&self, mutex: &Self::Mutex);

    /// Acquire the mutex if it is free, without blocking
    fn mutex_try_lock(&self, mutex: &Self::Mutex) -> bool;

    /// Release the mutex
    ///
    /// # Safety
    /// The calling context must currently hold the mutex.
    unsafe fn mutex_unlock(&self, mutex: &Self::Mutex);

    // === Semaphore ===

    /// Create a semaphore
    ///
    /// # Returns
    /// * `Err(ResultCode::InvalidParameter)` - `max == 0` or `initial > max`
    fn semaphore_create(&self, initial: u32, max: u32) -> DdResult<Self::Semaphore>;

    /// Increment the count and wake one waiter
    ///
    /// # Returns
    /// * `Err(ResultCode::LimitReached)` - Count is already at its maximum (unchanged)
    fn semaphore_signal(&self, semaphore: &Self::Semaphore) -> DdResult;

    /// Wait for a positive count, then decrement it
    ///
    /// # Returns
    /// * `Err(ResultCode::NotReady)` - Timed out; the count is unchanged
    fn semaphore_wait(&self, semaphore: &Self::Semaphore, timeout_ms: u32) -> DdResult;

    /// Snapshot of the current count
    fn semaphore_count(&self, semaphore: &Self::Semaphore) -> u32;

    // === Event ===

    fn event_create(&self, signaled: bool) -> Self::Event;

    /// Set the event and release every waiter; it stays set until cleared
    fn event_signal(&self, event: &Self::Event);

    fn event_clear(&self, event: &Self::Event);

    /// Wait for the event to be set
    ///
    /// # Returns
    /// * `Err(ResultCode::NotReady)` - Timed out
    fn event_wait(&self, event: &Self::Event, timeout_ms: u32) -> DdResult;

    fn event_is_signaled(&self, event: &Self::Event) -> bool;

    // === Thread ===

    /// Spawn a native thread running `entry`
    fn thread_spawn(&self, entry: ThreadEntry) -> DdResult<Self::Thread>;

    /// Wait for the native thread to exit and reclaim it
    ///
    /// # Returns
    /// * `Err(ResultCode::Aborted)` - The thread body panicked
    fn thread_join(&self, thread: Self::Thread) -> DdResult;

    /// Apply an OS-visible name to a running thread
    ///
    /// `name` is at most `THREAD_NAME_MAX_LEN` bytes. Platforms that cannot
    /// rename another thread accept the call and do nothing.
    fn thread_set_name(&self, thread: &Self::Thread, name: &str) -> DdResult;

    // === Library ===

    /// Open a dynamic library by name or path
    ///
    /// # Returns
    /// * `Err(ResultCode::FileNotFound)` - The module could not be located
    /// * `Err(ResultCode::Unavailable)` - Dynamic loading unsupported here
    /// * `Err(ResultCode::Error)` - Any other loader failure
    fn library_open(&self, name: &str) -> DdResult<Self::Library>;

    /// Look up a symbol address
    fn library_symbol(&self, library: &Self::Library, name: &str) -> Option<NonNull<c_void>>;

    fn library_close(&self, library: Self::Library);

    // === Time & Process ===

    /// Monotonic milliseconds since the provider's epoch
    fn current_time_ms(&self) -> u64;

    /// Monotonic high-resolution timestamp
    fn query_timestamp(&self) -> u64;

    /// Ticks per second of `query_timestamp`
    fn query_timestamp_frequency(&self) -> u64;

    fn sleep_ms(&self, ms: u32);

    fn yield_now(&self);

    fn process_id(&self) -> u32;

    fn process_name(&self) -> String;

    /// Describe the host OS and the current user
    ///
    /// # Returns
    /// * `Err(ResultCode::Error)` - The OS refused the version query
    fn os_info(&self) -> DdResult<OsInfo>;

    // === Debug ===

    /// Write a diagnostic line to the platform's console/debugger
    fn debug_write(&self, level: LogLevel, msg: &str);
}

/// Truncate `name` to at most `max_len` bytes on a char boundary
pub fn truncate_name(name: &str, max_len: usize) -> &str {
    if name.len() <= max_len {
        return name;
    }
    let mut end = max_len;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
