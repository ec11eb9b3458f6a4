//! The sync module builds pipeline barriers.
//!
//! - The [`barrier`] module provides the global, buffer and image barrier descriptors.
//! - The [`extension`] module provides the `pNext` chain elements that can be attached to them.
//! - The [`pipeline_barrier`] module provides the [`PipelineBarrier`](pipeline_barrier::PipelineBarrier) command
//! that flattens all of the above into native structures when it is recorded.

pub mod barrier;
pub mod extension;
pub mod pipeline_barrier;
