//! Dynamic libraries over `dlopen`/`dlsym`/`dlclose`

use core::ffi::c_void;
use core::ptr::NonNull;

use ddp_core::{DdResult, ResultCode};

/// Handle to an open module
#[derive(Debug)]
pub struct StdLibrary {
    handle: NonNull<c_void>,
}

// SAFETY: dlopen handles are process-global and the dl* functions are
// thread-safe; the handle itself is an opaque token.
unsafe impl Send for StdLibrary {}
unsafe impl Sync for StdLibrary {}

#[cfg(unix)]
impl StdLibrary {
    pub(super) fn open(name: &str) -> DdResult<Self> {
        use std::ffi::{CStr, CString};

        let c_name = CString::new(name).map_err(|_| ResultCode::InvalidParameter)?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if let Some(handle) = NonNull::new(raw) {
            return Ok(Self { handle });
        }

        // SAFETY: dlerror returns either null or a thread-local NUL-terminated string.
        let message = unsafe {
            let err = libc::dlerror();
            if err.is_null() {
                String::new()
            } else {
                CStr::from_ptr(err).to_string_lossy().into_owned()
            }
        };
        let code = classify_open_error(name, &message);
        tracing::debug!(library = name, %message, ?code, "dlopen failed");
        Err(code)
    }

    pub(super) fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let c_name = std::ffi::CString::new(name).ok()?;
        // SAFETY: `handle` came from a successful dlopen and has not been closed
        // (close consumes self); `c_name` is NUL-terminated.
        let raw = unsafe { libc::dlsym(self.handle.as_ptr(), c_name.as_ptr()) };
        NonNull::new(raw)
    }

    pub(super) fn close(self) {
        // SAFETY: `handle` came from a successful dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle.as_ptr());
        }
    }
}

#[cfg(unix)]
fn classify_open_error(name: &str, message: &str) -> ResultCode {
    let is_path = name.contains('/');
    if (is_path && !std::path::Path::new(name).exists())
        || message.contains("No such file")
        || message.contains("not found")
    {
        ResultCode::FileNotFound
    } else {
        ResultCode::Error
    }
}

#[cfg(not(unix))]
impl StdLibrary {
    pub(super) fn open(name: &str) -> DdResult<Self> {
        tracing::debug!(library = name, "dynamic loading unsupported on this platform");
        Err(ResultCode::Unavailable)
    }

    pub(super) fn symbol(&self, _name: &str) -> Option<NonNull<c_void>> {
        None
    }

    pub(super) fn close(self) {}
}
