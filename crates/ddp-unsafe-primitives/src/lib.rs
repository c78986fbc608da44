//! Driver Platform Unsafe Primitives - Consolidated Unsafe Code
//!
//! This crate contains the raw-memory and atomic code of the platform layer,
//! consolidated into a single auditable location. The wrappers in
//! `ddp-platform` build on it without writing `unsafe` themselves except at
//! the provider boundary.
//!
//! # Design Principles
//!
//! 1. **Minimal unsafe surface**: Only truly necessary unsafe operations
//! 2. **Safe wrappers**: Owning handles (`AllocBox`, `AllocArray`) next to the raw protocol
//! 3. **Auditable**: Small, focused modules for review
//!
//! # Module Organization
//!
//! - `alloc` - Allocator capability (`AllocCb`), object and array construction
//! - `bump` - Fixed-capacity bump arena exposed as an `AllocCb`
//! - `spin` - `AtomicLock` busy-wait lock
//! - `sync` - Send/Sync pointer wrapper for thread parameters
//! - `loom_tests` - Concurrency tests using loom (with `loom` feature)
//!
//! # Verification
//!
//! 1. **Loom tests** (`cargo test -p ddp-unsafe-primitives --features loom`): `AtomicLock` interleavings
//! 2. **Unit tests**: Construction/destruction ordering, header layout, failure paths

pub mod alloc;
pub mod bump;
pub mod spin;
pub mod sync;


// Re-export commonly used items
pub use alloc::{
    calloc, delete_array, delete_object, generic_alloc_cb, malloc, new_array, new_object,
    new_object_with, AllocArray, AllocBox, AllocCb, AllocFn, FreeFn, CACHE_LINE_BYTES,
    DEFAULT_ALIGNMENT, GENERIC_ALLOC_CB,
};
pub use bump::BumpArena;
pub use spin::{AtomicLock, AtomicLockGuard};
pub use sync::SendSyncPtr;
