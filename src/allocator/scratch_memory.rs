//! A linear CPU-side allocator for transient Vulkan structures.
//!
//! Vulkan wants contiguous arrays and `pNext` chains that stay at a fixed address until the call consuming them
//! returns. [`ScratchMemory`] hands out such memory by bumping an offset; nothing is freed individually. Memory is
//! released all at once by [`ScratchMemory::reset`], or automatically at the end of [`ScratchMemory::scope`].
//!
//! # Example
//! ```
//! # use deimos::prelude::*;
//! let mut scratch = ScratchMemory::with_capacity(256);
//! let count = scratch.scope(|scratch| {
//!     let values = scratch.alloc_slice_fill_iter([1u32, 2, 3]);
//!     values.len()
//! });
//! assert_eq!(count, 3);
//! assert_eq!(scratch.allocated_bytes(), 0);
//! ```

use std::cell::Cell;
use std::mem::size_of;

use bumpalo::Bump;

/// Bump allocator producing pointer-stable memory for native structures. Only `Copy` values can be allocated, since
/// nothing allocated from scratch memory is ever dropped.
#[derive(Debug, Default)]
pub struct ScratchMemory {
    bump: Bump,
    used: Cell<usize>,
}

/// Resets the scratch memory it borrows when dropped, so a scope releases its memory on every exit path.
struct ResetOnDrop<'s> {
    scratch: &'s mut ScratchMemory,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.scratch.reset();
    }
}

impl ScratchMemory {
    /// Create empty scratch memory. The first allocation reserves a chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create scratch memory with room for at least `bytes` bytes before it needs to grow.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
            used: Cell::new(0),
        }
    }

    /// Move a value into scratch memory. The returned reference stays valid until the next reset.
    pub fn alloc<T: Copy>(&self, value: T) -> &mut T {
        self.used.set(self.used.get() + size_of::<T>());
        self.bump.alloc(value)
    }

    /// Allocate a contiguous array from an iterator with a known length. An empty iterator yields an empty slice.
    /// The iterator may itself allocate from this scratch memory.
    pub fn alloc_slice_fill_iter<T: Copy, I>(&self, iter: I) -> &mut [T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator, {
        let slice = self.bump.alloc_slice_fill_iter(iter);
        self.used.set(self.used.get() + size_of::<T>() * slice.len());
        slice
    }

    /// Copy a slice into scratch memory.
    pub fn alloc_slice_copy<T: Copy>(&self, values: &[T]) -> &mut [T] {
        self.used.set(self.used.get() + size_of::<T>() * values.len());
        self.bump.alloc_slice_copy(values)
    }

    /// Number of bytes handed out since the last reset, not counting alignment padding.
    pub fn allocated_bytes(&self) -> usize {
        self.used.get()
    }

    /// Number of bytes held in chunks, used or not. Stays the same across a reset unless memory had to be added.
    pub fn reserved_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Release all allocations. Chunks are kept around, so a reset allocator can be reused without touching the
    /// system allocator again.
    pub fn reset(&mut self) {
        self.bump.reset();
        self.used.set(0);
    }

    /// Run `f` with access to this scratch memory, and reset it afterwards. The reset also happens if `f` returns
    /// early through `?` or panics, so no allocation made inside the scope can be observed after it.
    pub fn scope<R>(&mut self, f: impl FnOnce(&ScratchMemory) -> R) -> R {
        let guard = ResetOnDrop {
            scratch: self,
        };
        f(&*guard.scratch)
    }
}
