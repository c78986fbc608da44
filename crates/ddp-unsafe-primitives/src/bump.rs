//! Fixed-capacity bump arena
//!
//! Hands out blocks from one heap buffer by advancing a head offset. Blocks
//! are never freed individually; the whole buffer is released when the arena
//! is dropped. Useful for scratch allocations that share one lifetime, and as
//! an instrumented allocator for tests (`used()` shows exactly what was taken).
//!
//! # Safety Invariants
//!
//! 1. **No double free**: `free` is a no-op
//! 2. **Alignment guaranteed**: every block is aligned to the requested power of two
//! 3. **No overlap**: the head only moves forward, claimed by compare-exchange
//! 4. **Lifetime**: an `AllocCb` from [`BumpArena::alloc_cb`] must not outlive the arena

use core::ffi::c_void;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::alloc::Layout;

use crate::alloc::{AllocCb, CACHE_LINE_BYTES};

/// Bump arena over an owned, cache-line aligned buffer
pub struct BumpArena {
    base: NonNull<u8>,
    capacity: usize,
    /// Current allocation head (offset from `base`)
    head: AtomicUsize,
}

// SAFETY: the buffer is owned by the arena and the head is only advanced by
// atomic compare-exchange, so concurrent allocations never overlap.
unsafe impl Send for BumpArena {}
unsafe impl Sync for BumpArena {}

impl BumpArena {
    /// Create an arena with `capacity` bytes; `None` if the heap is exhausted
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let layout = Layout::from_size_align(capacity.max(1), CACHE_LINE_BYTES).ok()?;
        // SAFETY: layout has non-zero size.
        let base = NonNull::new(unsafe { std::alloc::alloc_zeroed(layout) })?;
        Some(Self {
            base,
            capacity,
            head: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far, including alignment padding
    pub fn used(&self) -> usize {
        self.head.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.used())
    }

    /// Claim `size` bytes at `align`; null when the arena is exhausted
    pub fn alloc(&self, size: usize, align: usize, zero: bool) -> *mut u8 {
        if !align.is_power_of_two() {
            return ptr::null_mut();
        }
        let base = self.base.as_ptr() as usize;
        loop {
            let head = self.head.load(Ordering::Relaxed);
            let Some(aligned) = (base + head).checked_add(align - 1).map(|a| a & !(align - 1))
            else {
                return ptr::null_mut();
            };
            let offset = aligned - base;
            let Some(new_head) = offset.checked_add(size) else {
                return ptr::null_mut();
            };
            if new_head > self.capacity {
                return ptr::null_mut();
            }

            if self
                .head
                .compare_exchange_weak(head, new_head, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                // SAFETY: offset + size <= capacity, so the block is inside the buffer.
                let block = unsafe { self.base.as_ptr().add(offset) };
                if zero {
                    // SAFETY: this thread exclusively owns the claimed range.
                    unsafe { ptr::write_bytes(block, 0, size) };
                }
                return block;
            }
            // Another thread claimed space first; retry from the new head.
        }
    }

    /// Expose the arena through the allocator protocol.
    ///
    /// # Safety
    /// The returned capability and all copies of it must not be used after the
    /// arena is dropped.
    pub unsafe fn alloc_cb(&self) -> AllocCb {
        // SAFETY: bump_alloc/bump_free only use the context as `&BumpArena`,
        // which the caller keeps alive; the arena is Sync.
        unsafe {
            AllocCb::new(
                self as *const Self as *mut c_void,
                bump_alloc,
                bump_free,
            )
        }
    }
}

impl Drop for BumpArena {
    fn drop(&mut self) {
        // SAFETY: same layout as in with_capacity, which already validated it.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity.max(1), CACHE_LINE_BYTES);
            std::alloc::dealloc(self.base.as_ptr(), layout);
        }
    }
}

impl core::fmt::Debug for BumpArena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BumpArena")
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .finish()
    }
}

fn bump_alloc(context: *mut c_void, size: usize, align: usize, zero: bool) -> *mut u8 {
    // SAFETY: context was set from a live &BumpArena in alloc_cb.
    let arena = unsafe { &*(context as *const BumpArena) };
    arena.alloc(size, align, zero)
}

unsafe fn bump_free(_context: *mut c_void, _ptr: *mut u8) {
    // Memory is reclaimed when the arena is dropped.
}
