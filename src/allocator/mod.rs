//! Exposes the allocators used while recording commands.
//!
//! - [`ScratchMemory`](crate::allocator::scratch_memory::ScratchMemory): linear allocator for native structures
//!   that only need to live for the duration of a single recording call.

pub mod scratch_memory;
