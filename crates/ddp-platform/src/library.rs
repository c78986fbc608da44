//! Dynamic library handle
//!
//! A `Library` holds at most one loaded module and closes it on drop.

use core::ffi::c_void;
use core::fmt;
use core::mem::size_of;
use core::ptr::NonNull;

use ddp_core::DdResult;
use ddp_hal::{Platform, StdPlatform};

pub struct Library<P: Platform = StdPlatform> {
    platform: P,
    handle: Option<P::Library>,
}

impl Library<StdPlatform> {
    pub fn new() -> Self {
        Self::new_in(StdPlatform)
    }
}

impl Default for Library<StdPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Library<P> {
    pub fn new_in(platform: P) -> Self {
        Self {
            platform,
            handle: None,
        }
    }

    /// Load `name`, closing any module already held
    ///
    /// # Returns
    /// * `Err(ResultCode::FileNotFound)` - The module could not be located
    /// * `Err(ResultCode::Error)` - Any other loader failure
    ///
    /// On failure nothing is held.
    pub fn load(&mut self, name: &str) -> DdResult {
        self.close();
        let handle = self.platform.library_open(name)?;
        tracing::debug!(library = name, "library loaded");
        self.handle = Some(handle);
        Ok(())
    }

    /// Release the module; no-op when nothing is held
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.platform.library_close(handle);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Address of an exported symbol
    pub fn get_function(&self, name: &str) -> Option<NonNull<c_void>> {
        let handle = self.handle.as_ref()?;
        self.platform.library_symbol(handle, name)
    }

    /// Exported symbol reinterpreted as `F`, typically an `extern "C" fn` type
    ///
    /// Returns `None` if the symbol is missing or `F` is not pointer sized.
    ///
    /// # Safety
    /// `F` must match the symbol's real type and calling convention, and the
    /// value must not be used after this library is closed.
    pub unsafe fn get_function_as<F: Copy>(&self, name: &str) -> Option<F> {
        if size_of::<F>() != size_of::<*mut c_void>() {
            return None;
        }
        let address = self.get_function(name)?.as_ptr();
        // SAFETY: sizes match; the caller vouches for the type.
        Some(unsafe { core::mem::transmute_copy::<*mut c_void, F>(&address) })
    }

    /// Exchange modules without reloading either
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

impl<P: Platform> Drop for Library<P> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<P: Platform> fmt::Debug for Library<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use ddp_core::ResultCode;

    // glibc ships libm under this soname on every Linux distribution.
    const LIBM: &str = "libm.so.6";

    #[test]
    fn test_load_libm_and_call() {
        let mut library = Library::new();
        library.load(LIBM).unwrap();
        assert!(library.is_loaded());

        let cos = unsafe { library.get_function_as::<extern "C" fn(f64) -> f64>("cos") };
        let cos = cos.unwrap();
        assert_eq!(cos(0.0), 1.0);
        assert!(library.get_function("definitely_not_a_symbol").is_none());
    }

    #[test]
    fn test_failed_load_holds_nothing() {
        let mut library = Library::new();
        library.load(LIBM).unwrap();
        assert_eq!(
            library.load("/no/such/dir/libnothing.so"),
            Err(ResultCode::FileNotFound)
        );
        assert!(!library.is_loaded());
        assert!(library.get_function("cos").is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut library = Library::new();
        library.close();
        library.load(LIBM).unwrap();
        library.close();
        library.close();
        assert!(!library.is_loaded());
    }

    #[test]
    fn test_wrong_size_target_is_none() {
        let mut library = Library::new();
        library.load(LIBM).unwrap();
        assert!(unsafe { library.get_function_as::<[usize; 2]>("cos") }.is_none());
    }
}
