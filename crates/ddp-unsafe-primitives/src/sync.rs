//! Send/Sync pointer wrapper for thread parameters
//!
//! Native thread entry points receive an opaque parameter. When that
//! parameter is a raw pointer owned elsewhere, `SendSyncPtr` carries it into
//! the spawned closure.

use core::ptr::NonNull;

/// A non-null pointer wrapper that is Send + Sync.
///
/// # Safety Invariants
///
/// 1. The pointee must outlive every thread holding a copy
/// 2. Access must be externally synchronized (a lock, or a join before reuse)
#[repr(transparent)]
pub struct SendSyncPtr<T> {
    ptr: NonNull<T>,
}

impl<T> SendSyncPtr<T> {
    /// # Safety
    ///
    /// The pointer must stay valid for every use made through the wrapper,
    /// and cross-thread access must be synchronized by the caller.
    pub const unsafe fn new(ptr: NonNull<T>) -> Self {
        Self { ptr }
    }

    /// Returns `None` for null.
    ///
    /// # Safety
    ///
    /// Same contract as [`SendSyncPtr::new`].
    pub unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// # Safety
    ///
    /// No mutable reference to the pointee may exist for the returned lifetime.
    pub unsafe fn as_ref(&self) -> &T {
        // SAFETY: forwarded caller contract.
        unsafe { self.ptr.as_ref() }
    }

    /// # Safety
    ///
    /// No other reference to the pointee may exist for the returned lifetime.
    pub unsafe fn as_mut(&mut self) -> &mut T {
        // SAFETY: forwarded caller contract.
        unsafe { self.ptr.as_mut() }
    }
}

// SAFETY: the constructor contract makes the caller responsible for validity
// and synchronization across threads.
unsafe impl<T> Send for SendSyncPtr<T> {}
unsafe impl<T> Sync for SendSyncPtr<T> {}

impl<T> Clone for SendSyncPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendSyncPtr<T> {}

impl<T> core::fmt::Debug for SendSyncPtr<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SendSyncPtr").field(&self.ptr).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_from_raw() {
        let mut value = 42;
        assert!(unsafe { SendSyncPtr::from_raw(&mut value as *mut i32) }.is_some());
        assert!(unsafe { SendSyncPtr::<i32>::from_raw(core::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_cross_thread_write_then_join() {
        let mut value = 0u32;
        let ptr = unsafe { SendSyncPtr::new(NonNull::from(&mut value)) };
        thread::spawn(move || {
            let mut ptr = ptr;
            // SAFETY: the spawning thread does not touch `value` until join.
            unsafe { *ptr.as_mut() = 7 };
        })
        .join()
        .unwrap();
        assert_eq!(value, 7);
    }

    fn _assert_send<T: Send>() {}
    fn _assert_sync<T: Sync>() {}

    #[test]
    fn test_send_sync_traits() {
        _assert_send::<SendSyncPtr<()>>();
        _assert_sync::<SendSyncPtr<()>>();
    }
}
