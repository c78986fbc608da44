//! Driver Platform Layer
//!
//! User-facing primitives built over a native provider (`ddp_hal::Platform`):
//!
//! - `sync` - `Mutex` (guard based), `Semaphore` (bounded count), `Event` (manual reset)
//! - `thread` - `Thread` with timed join and naming
//! - `library` - `Library`, a dynamic module handle
//! - `platform` - Time, sleep, process and host identity, `mkdir`/`abs_path`, `PlatformSink`
//!
//! Every wrapper defaults to `StdPlatform`; tests substitute
//! `ddp_hal_mock::MockPlatform` through the `new_in` constructors.
//!
//! The result model, diagnostics, PRNG and allocator protocol are
//! re-exported from `ddp-core` and `ddp-unsafe-primitives`.

pub mod library;
pub mod platform;
pub mod sync;
pub mod thread;

pub use library::Library;
pub use platform::{
    abs_path, current_time_ms, mkdir, os_info, process_id, process_name, query_timestamp,
    query_timestamp_frequency, sleep, MkdirStatus, PlatformSink,
};
pub use sync::{Event, Mutex, MutexGuard, Semaphore};
pub use thread::Thread;

pub use ddp_core::{
    dd_alert, dd_alert_always, dd_alert_reason, dd_assert, dd_assert_always, dd_assert_reason,
    dd_dbg, dd_log, dd_not_implemented, dd_print, dd_unhandled_result, dd_unreachable, dd_warn,
    dd_warn_always, dd_warn_reason,
};
pub use ddp_core::{
    install_logger, logger, result_to_str, AssertAction, DdResult, LogLevel, LogSink, Logger,
    PlatformConfig, Random, ResultCode, TracingSink,
};
pub use ddp_hal::{OsInfo, Platform, StdPlatform, INFINITE_TIMEOUT};
pub use ddp_unsafe_primitives::{
    calloc, delete_array, delete_object, generic_alloc_cb, malloc, new_array, new_object,
    AllocArray, AllocBox, AllocCb, AtomicLock, BumpArena, GENERIC_ALLOC_CB,
};
