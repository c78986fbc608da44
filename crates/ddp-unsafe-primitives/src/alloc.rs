//! Allocator capability and object construction
//!
//! An [`AllocCb`] bundles a context pointer with allocate/free functions.
//! It never owns memory; it is copied by value to every call site that
//! needs to allocate.
//!
//! # Allocation Kinds
//!
//! | Create | Destroy | Layout |
//! |--------|---------|--------|
//! | `new_object` | `delete_object` | `size_of::<T>()` at `align_of::<T>()` |
//! | `new_array` | `delete_array` | one cache line of header, then `n` elements |
//! | `AllocBox::new_in` | drop | as `new_object` |
//! | `AllocArray::new_in` | drop | `n` elements, count kept in the handle |
//!
//! # Safety Invariants
//!
//! 1. **Matched pair**: a block is freed by the allocator that produced it
//! 2. **Matched kind**: `delete_array` only receives pointers from `new_array`,
//!    `delete_object` only pointers from `new_object`
//! 3. **Header layout**: the element count of an array lives in the `usize`
//!    immediately before the first element; the block starts one cache line
//!    before the first element
//!
//! Neither pairing is checked at runtime.

use core::ffi::c_void;
use core::marker::PhantomData;
use core::mem::{align_of, size_of};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use std::alloc::Layout;

/// Bytes reserved in front of every array allocation
pub const CACHE_LINE_BYTES: usize = 64;

/// Alignment used by [`AllocCb::alloc_default`]
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Allocate `size` bytes at `align`, zero-filled when `zero`; null on failure
pub type AllocFn = fn(context: *mut c_void, size: usize, align: usize, zero: bool) -> *mut u8;

/// Release a block; must accept null
pub type FreeFn = unsafe fn(context: *mut c_void, ptr: *mut u8);

/// Allocator capability: context plus allocate/free functions
#[derive(Clone, Copy, Debug)]
pub struct AllocCb {
    context: *mut c_void,
    alloc_fn: AllocFn,
    free_fn: FreeFn,
}

// SAFETY: `AllocCb::new` requires the functions to be callable with `context`
// from any thread for as long as the capability is in use.
unsafe impl Send for AllocCb {}
unsafe impl Sync for AllocCb {}

impl AllocCb {
    /// Build a capability from raw parts.
    ///
    /// # Safety
    ///
    /// For as long as this value or any copy of it is used:
    /// 1. `alloc_fn` and `free_fn` must be sound to call with `context`
    /// 2. Both must be safe to call concurrently from any thread, or the caller
    ///    must keep every copy on a single thread
    /// 3. `free_fn` must accept null and every pointer `alloc_fn` returned
    pub const unsafe fn new(context: *mut c_void, alloc_fn: AllocFn, free_fn: FreeFn) -> Self {
        Self {
            context,
            alloc_fn,
            free_fn,
        }
    }

    pub fn context(&self) -> *mut c_void {
        self.context
    }

    /// Allocate; null on failure, never panics
    #[inline]
    pub fn alloc(&self, size: usize, align: usize, zero: bool) -> *mut u8 {
        (self.alloc_fn)(self.context, size, align, zero)
    }

    /// Allocate at [`DEFAULT_ALIGNMENT`]
    #[inline]
    pub fn alloc_default(&self, size: usize, zero: bool) -> *mut u8 {
        self.alloc(size, DEFAULT_ALIGNMENT, zero)
    }

    /// Release a block
    ///
    /// # Safety
    /// `ptr` must be null or a live block returned by this allocator.
    #[inline]
    pub unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { (self.free_fn)(self.context, ptr) }
    }
}

/// Allocate uninitialized memory
pub fn malloc(alloc: &AllocCb, size: usize, align: usize) -> *mut u8 {
    alloc.alloc(size, align, false)
}

/// Allocate zero-filled memory
pub fn calloc(alloc: &AllocCb, size: usize, align: usize) -> *mut u8 {
    alloc.alloc(size, align, true)
}

// ============================================================================
// Single objects
// ============================================================================

/// Frees a block on unwind if construction panics
struct FreeOnUnwind<'a> {
    block: *mut u8,
    alloc: &'a AllocCb,
}

impl Drop for FreeOnUnwind<'_> {
    fn drop(&mut self) {
        // SAFETY: `block` came from `alloc` and holds no constructed value.
        unsafe { self.alloc.free(self.block) }
    }
}

/// Allocate and move `value` into the new block.
///
/// Returns `None` (dropping `value`) if the allocator fails.
pub fn new_object<T>(alloc: &AllocCb, value: T) -> Option<NonNull<T>> {
    new_object_with(alloc, move || value)
}

/// Allocate, then construct in place with `init`.
///
/// `init` only runs once the allocation has succeeded.
pub fn new_object_with<T, F>(alloc: &AllocCb, init: F) -> Option<NonNull<T>>
where
    F: FnOnce() -> T,
{
    // Zero-sized types still get a distinct one-byte block.
    let size = size_of::<T>().max(1);
    let block = NonNull::new(alloc.alloc(size, align_of::<T>(), true))?;
    debug_assert_eq!(block.as_ptr() as usize % align_of::<T>(), 0);

    let guard = FreeOnUnwind {
        block: block.as_ptr(),
        alloc,
    };
    let value = init();
    core::mem::forget(guard);

    let object = block.cast::<T>();
    // SAFETY: `object` is non-null, aligned for T and at least size_of::<T>() bytes.
    unsafe { object.as_ptr().write(value) };
    Some(object)
}

/// Drop the object (if non-null) and free its block.
///
/// # Safety
/// `object` must be null or a live pointer from `new_object`/`new_object_with`
/// with this allocator, and must not be used afterwards.
pub unsafe fn delete_object<T>(object: *mut T, alloc: &AllocCb) {
    if !object.is_null() {
        // SAFETY: caller guarantees a live, initialized object.
        unsafe { ptr::drop_in_place(object) };
    }
    // SAFETY: null or a block from this allocator.
    unsafe { alloc.free(object.cast()) };
}

// ============================================================================
// Arrays with hidden header
// ============================================================================

/// Header pointer for an array whose first element is at `elements`
///
/// # Safety
/// `elements` must come from `new_array`.
unsafe fn header_slot<T>(elements: *mut T) -> *mut usize {
    // SAFETY: new_array reserved CACHE_LINE_BYTES before the elements.
    unsafe { elements.cast::<u8>().sub(size_of::<usize>()).cast::<usize>() }
}

/// Drops constructed elements and frees the block if default construction panics
struct PartialArray<'a, T> {
    block: *mut u8,
    elements: *mut T,
    constructed: usize,
    alloc: &'a AllocCb,
}

impl<T> Drop for PartialArray<'_, T> {
    fn drop(&mut self) {
        // SAFETY: exactly `constructed` leading elements are initialized and
        // `block` came from `alloc`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.elements, self.constructed));
            self.alloc.free(self.block);
        }
    }
}

/// Allocate `count` default-constructed elements behind a cache-line header.
///
/// Elements are constructed in ascending index order. Returns `None` without
/// constructing anything if the size overflows, `T` needs more than cache-line
/// alignment, or the allocator fails.
pub fn new_array<T: Default>(count: usize, alloc: &AllocCb) -> Option<NonNull<T>> {
    if align_of::<T>() > CACHE_LINE_BYTES {
        return None;
    }
    let size = size_of::<T>()
        .checked_mul(count)?
        .checked_add(CACHE_LINE_BYTES)?;
    let block = NonNull::new(alloc.alloc(size, CACHE_LINE_BYTES, false))?;
    debug_assert_eq!(block.as_ptr() as usize % CACHE_LINE_BYTES, 0);

    // SAFETY: the block is at least CACHE_LINE_BYTES + count * size_of::<T>() bytes.
    let elements = unsafe { block.as_ptr().add(CACHE_LINE_BYTES).cast::<T>() };
    // SAFETY: the header word lies inside the reserved cache line and is usize-aligned.
    unsafe { header_slot(elements).write(count) };

    let mut partial = PartialArray {
        block: block.as_ptr(),
        elements,
        constructed: 0,
        alloc,
    };
    for index in 0..count {
        // SAFETY: index < count, inside the block, aligned since the base is.
        unsafe { elements.add(index).write(T::default()) };
        partial.constructed += 1;
    }
    core::mem::forget(partial);

    NonNull::new(elements)
}

/// Element count stored in an array header
///
/// # Safety
/// `elements` must be a live pointer from `new_array`.
pub unsafe fn array_len<T>(elements: NonNull<T>) -> usize {
    // SAFETY: forwarded caller contract.
    unsafe { header_slot(elements.as_ptr()).read() }
}

/// Drop every element in ascending order, then free from the header address.
///
/// Null is a no-op.
///
/// # Safety
/// `elements` must be null or a live pointer from `new_array` with this
/// allocator, and must not be used afterwards.
pub unsafe fn delete_array<T>(elements: *mut T, alloc: &AllocCb) {
    let Some(elements) = NonNull::new(elements) else {
        return;
    };
    // SAFETY: caller guarantees a live `new_array` pointer.
    unsafe {
        let count = array_len(elements);
        // Slices drop their elements front to back.
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(elements.as_ptr(), count));
        alloc.free(elements.as_ptr().cast::<u8>().sub(CACHE_LINE_BYTES));
    }
}

// ============================================================================
// Owning handles
// ============================================================================

/// Owning pointer to a single object in allocator memory
pub struct AllocBox<T> {
    ptr: NonNull<T>,
    alloc: AllocCb,
    _marker: PhantomData<T>,
}

// SAFETY: AllocBox owns its T exclusively; AllocCb is Send + Sync.
unsafe impl<T: Send> Send for AllocBox<T> {}
unsafe impl<T: Sync> Sync for AllocBox<T> {}

impl<T> AllocBox<T> {
    /// Returns `None` if the allocator fails
    pub fn new_in(value: T, alloc: AllocCb) -> Option<Self> {
        let ptr = new_object(&alloc, value)?;
        Some(Self {
            ptr,
            alloc,
            _marker: PhantomData,
        })
    }

    pub fn allocator(&self) -> &AllocCb {
        &self.alloc
    }

    /// Give up ownership; release later with `delete_object`
    pub fn into_raw(this: Self) -> NonNull<T> {
        let ptr = this.ptr;
        core::mem::forget(this);
        ptr
    }
}

impl<T> Deref for AllocBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr is a live, initialized T owned by self.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for AllocBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: ptr is a live, initialized T exclusively owned by self.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for AllocBox<T> {
    fn drop(&mut self) {
        // SAFETY: ptr came from new_object with self.alloc.
        unsafe { delete_object(self.ptr.as_ptr(), &self.alloc) }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for AllocBox<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AllocBox").field(&**self).finish()
    }
}

/// Owning array in allocator memory; the length lives in the handle
pub struct AllocArray<T> {
    ptr: NonNull<T>,
    len: usize,
    alloc: AllocCb,
    _marker: PhantomData<T>,
}

// SAFETY: AllocArray owns its elements exclusively; AllocCb is Send + Sync.
unsafe impl<T: Send> Send for AllocArray<T> {}
unsafe impl<T: Sync> Sync for AllocArray<T> {}

impl<T: Default> AllocArray<T> {
    /// Allocate `len` default-constructed elements; `None` if the allocator fails
    pub fn new_in(len: usize, alloc: AllocCb) -> Option<Self> {
        let size = size_of::<T>().checked_mul(len)?.max(1);
        let block = NonNull::new(alloc.alloc(size, align_of::<T>(), false))?;
        let elements = block.as_ptr().cast::<T>();

        let mut partial = PartialArray {
            block: block.as_ptr(),
            elements,
            constructed: 0,
            alloc: &alloc,
        };
        for index in 0..len {
            // SAFETY: index < len, inside the block, aligned for T.
            unsafe { elements.add(index).write(T::default()) };
            partial.constructed += 1;
        }
        core::mem::forget(partial);

        Some(Self {
            ptr: block.cast(),
            len,
            alloc,
            _marker: PhantomData,
        })
    }
}

impl<T> AllocArray<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn allocator(&self) -> &AllocCb {
        &self.alloc
    }
}

impl<T> Deref for AllocArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr points to len initialized elements owned by self.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for AllocArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: ptr points to len initialized elements exclusively owned by self.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for AllocArray<T> {
    fn drop(&mut self) {
        // SAFETY: len elements are initialized; the block came from self.alloc.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
            self.alloc.free(self.ptr.as_ptr().cast());
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for AllocArray<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// ============================================================================
// Generic heap allocator
// ============================================================================

/// Bytes in front of each generic block holding (total size, offset)
const GENERIC_PREFIX: usize = 2 * size_of::<usize>();

fn generic_alloc(_context: *mut c_void, size: usize, align: usize, zero: bool) -> *mut u8 {
    let align = align.max(GENERIC_PREFIX);
    if !align.is_power_of_two() {
        return ptr::null_mut();
    }
    // The prefix is padded to a full alignment unit so the payload stays aligned.
    let Some(total) = size.checked_add(align) else {
        return ptr::null_mut();
    };
    let Ok(layout) = Layout::from_size_align(total, align) else {
        return ptr::null_mut();
    };
    // SAFETY: layout has non-zero size (total >= align >= GENERIC_PREFIX).
    let base = unsafe {
        if zero {
            std::alloc::alloc_zeroed(layout)
        } else {
            std::alloc::alloc(layout)
        }
    };
    if base.is_null() {
        return base;
    }
    // SAFETY: base + align is within the block; the two prefix words sit
    // directly before it and are usize-aligned since align >= GENERIC_PREFIX.
    unsafe {
        let payload = base.add(align);
        let prefix = payload.sub(GENERIC_PREFIX).cast::<usize>();
        prefix.write(total);
        prefix.add(1).write(align);
        payload
    }
}

unsafe fn generic_free(_context: *mut c_void, ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: ptr came from generic_alloc, which stored (total, align) just before it.
    unsafe {
        let prefix = ptr.sub(GENERIC_PREFIX).cast::<usize>();
        let total = prefix.read();
        let align = prefix.add(1).read();
        let layout = Layout::from_size_align_unchecked(total, align);
        std::alloc::dealloc(ptr.sub(align), layout);
    }
}

/// Allocator deferring to the process heap; `free` needs no size
// SAFETY: generic_alloc/generic_free ignore the context, are thread-safe, and
// generic_free accepts null.
pub static GENERIC_ALLOC_CB: AllocCb =
    unsafe { AllocCb::new(ptr::null_mut(), generic_alloc, generic_free) };

/// Copy of [`GENERIC_ALLOC_CB`]
pub fn generic_alloc_cb() -> AllocCb {
    GENERIC_ALLOC_CB
}
