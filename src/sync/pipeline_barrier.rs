//! The pipeline barrier command.
//!
//! # Example
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn make_upload_barrier(buffer: vk::Buffer) -> PipelineBarrier {
//!     PipelineBarrier::new(
//!         vk::PipelineStageFlags::TRANSFER,
//!         vk::PipelineStageFlags::VERTEX_INPUT,
//!         vk::DependencyFlags::empty(),
//!     )
//!     .buffer_barrier(
//!         BufferMemoryBarrier::new(buffer, 0, vk::WHOLE_SIZE)
//!             .access(vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::VERTEX_ATTRIBUTE_READ),
//!     )
//! }
//! ```

use std::mem::size_of;

use anyhow::Result;
use ash::vk;

use crate::allocator::scratch_memory::ScratchMemory;
use crate::command::recorder::{CommandRecorder, PipelineBarrierInfo};
use crate::command::Command;
use crate::node::{Node, Visitor};
use crate::sync::barrier::{BufferMemoryBarrier, ImageMemoryBarrier, MemoryBarrier};

/// A `vkCmdPipelineBarrier` command with any number of global, buffer and image barriers.
#[derive(Debug, Clone, Default)]
pub struct PipelineBarrier {
    pub src_stage_mask: vk::PipelineStageFlags,
    pub dst_stage_mask: vk::PipelineStageFlags,
    pub dependency_flags: vk::DependencyFlags,
    pub memory_barriers: Vec<MemoryBarrier>,
    pub buffer_memory_barriers: Vec<BufferMemoryBarrier>,
    pub image_memory_barriers: Vec<ImageMemoryBarrier>,
}

impl PipelineBarrier {
    /// Create an empty pipeline barrier between two pipeline stages.
    pub fn new(src_stage_mask: vk::PipelineStageFlags, dst_stage_mask: vk::PipelineStageFlags, dependency_flags: vk::DependencyFlags) -> Self {
        Self {
            src_stage_mask,
            dst_stage_mask,
            dependency_flags,
            ..Default::default()
        }
    }

    /// Add a global memory barrier.
    pub fn memory_barrier(mut self, barrier: MemoryBarrier) -> Self {
        self.memory_barriers.push(barrier);
        self
    }

    /// Add a buffer memory barrier.
    pub fn buffer_barrier(mut self, barrier: BufferMemoryBarrier) -> Self {
        self.buffer_memory_barriers.push(barrier);
        self
    }

    /// Add an image memory barrier.
    pub fn image_barrier(mut self, barrier: ImageMemoryBarrier) -> Self {
        self.image_memory_barriers.push(barrier);
        self
    }

    /// Number of scratch bytes needed to record this barrier without growing the scratch memory.
    pub fn scratch_size(&self) -> usize {
        // Room for alignment padding of the three arrays.
        let padding = 3 * size_of::<u64>();
        padding
            + self.memory_barriers.iter().map(MemoryBarrier::scratch_size).sum::<usize>()
            + self.buffer_memory_barriers.iter().map(BufferMemoryBarrier::scratch_size).sum::<usize>()
            + self.image_memory_barriers.iter().map(ImageMemoryBarrier::scratch_size).sum::<usize>()
    }

    /// Record this barrier using caller-provided scratch memory. The scratch memory is reset when this returns,
    /// whether recording succeeded or not.
    pub fn record_with(&self, recorder: &mut dyn CommandRecorder, scratch: &mut ScratchMemory) -> Result<()> {
        scratch.scope(|scratch| {
            let memory_barriers = scratch.alloc_slice_fill_iter(self.memory_barriers.iter().map(|barrier| barrier.assign(scratch)));
            let buffer_memory_barriers =
                scratch.alloc_slice_fill_iter(self.buffer_memory_barriers.iter().map(|barrier| barrier.assign(scratch)));
            let image_memory_barriers =
                scratch.alloc_slice_fill_iter(self.image_memory_barriers.iter().map(|barrier| barrier.assign(scratch)));

            trace!(
                "Recording pipeline barrier {:?} -> {:?} ({} memory, {} buffer, {} image barriers)",
                self.src_stage_mask,
                self.dst_stage_mask,
                memory_barriers.len(),
                buffer_memory_barriers.len(),
                image_memory_barriers.len()
            );

            recorder.pipeline_barrier(&PipelineBarrierInfo {
                src_stage_mask: self.src_stage_mask,
                dst_stage_mask: self.dst_stage_mask,
                dependency_flags: self.dependency_flags,
                memory_barriers,
                buffer_memory_barriers,
                image_memory_barriers,
            })
        })
    }
}

impl Node for PipelineBarrier {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_command(self)
    }
}

impl Command for PipelineBarrier {
    /// Record using the recorder's own scratch memory.
    fn record(&self, recorder: &mut dyn CommandRecorder) -> Result<()> {
        // The recorder is borrowed again for the barrier call, so its scratch memory is moved out meanwhile.
        let mut scratch = std::mem::take(recorder.scratch_memory());
        let result = self.record_with(recorder, &mut scratch);
        *recorder.scratch_memory() = scratch;
        result
    }
}
