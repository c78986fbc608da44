//! Native threads over `std::thread`

use std::thread::JoinHandle;

use ddp_core::{DdResult, ResultCode};

use crate::ThreadEntry;

/// Linux limits thread names to 16 bytes including the terminator
#[cfg(target_os = "linux")]
pub(super) const NAME_MAX_LEN: usize = 15;

#[cfg(not(target_os = "linux"))]
pub(super) const NAME_MAX_LEN: usize = 63;

/// Joinable native thread
#[derive(Debug)]
pub struct StdThread {
    handle: JoinHandle<()>,
}

impl StdThread {
    pub(super) fn spawn(entry: ThreadEntry) -> DdResult<Self> {
        let handle = std::thread::Builder::new().spawn(entry).map_err(|e| {
            tracing::warn!(error = %e, "native thread spawn failed");
            ResultCode::Error
        })?;
        Ok(Self { handle })
    }

    pub(super) fn join(self) -> DdResult {
        self.handle.join().map_err(|_| ResultCode::Aborted)
    }

    #[cfg(target_os = "linux")]
    pub(super) fn set_name(&self, name: &str) -> DdResult {
        use std::ffi::CString;
        use std::os::unix::thread::JoinHandleExt;

        let name = CString::new(name).map_err(|_| ResultCode::InvalidParameter)?;
        let pthread = self.handle.as_pthread_t();
        // SAFETY: `pthread` refers to a thread that has not been joined (we own
        // its JoinHandle), and `name` is a valid NUL-terminated string of at
        // most NAME_MAX_LEN bytes plus terminator.
        let rc = unsafe { libc::pthread_setname_np(pthread, name.as_ptr()) };
        if rc == 0 {
            Ok(())
        } else {
            tracing::debug!(rc, "pthread_setname_np failed");
            Err(ResultCode::Error)
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub(super) fn set_name(&self, _name: &str) -> DdResult {
        // Only the calling thread can be renamed here; the name is kept by the wrapper.
        Ok(())
    }
}
