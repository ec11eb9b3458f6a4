//! The record target commands are recorded into.

use anyhow::Result;
use ash::vk;

use crate::allocator::scratch_memory::ScratchMemory;

/// Native form of a pipeline barrier, ready to be submitted as one `vkCmdPipelineBarrier` call. Every array is
/// present, possibly empty, and every pointer inside it stays valid for as long as this struct is borrowed.
#[derive(Debug, Copy, Clone)]
pub struct PipelineBarrierInfo<'a> {
    pub src_stage_mask: vk::PipelineStageFlags,
    pub dst_stage_mask: vk::PipelineStageFlags,
    pub dependency_flags: vk::DependencyFlags,
    pub memory_barriers: &'a [vk::MemoryBarrier],
    pub buffer_memory_barriers: &'a [vk::BufferMemoryBarrier],
    pub image_memory_barriers: &'a [vk::ImageMemoryBarrier],
}

/// Anything commands can be recorded into.
pub trait CommandRecorder {
    /// Record a pipeline barrier. The info and everything it points to is only valid for the duration of this call,
    /// implementations must not hold on to it.
    fn pipeline_barrier(&mut self, info: &PipelineBarrierInfo<'_>) -> Result<()>;

    /// Scratch memory owned by this recorder. Commands serialize their native structures into it and reset it before
    /// returning, so its chunks are reused by every command recorded here.
    fn scratch_memory(&mut self) -> &mut ScratchMemory;
}

/// A `VkCommandBuffer` in the recording state. Beginning, ending and submitting the command buffer is up to the owner
/// of the handle. Obtain one through [`LogicalDevice::command_buffer()`](crate::core::device::LogicalDevice::command_buffer).
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CommandBuffer {
    #[derivative(Debug = "ignore")]
    device: ash::Device,
    handle: vk::CommandBuffer,
    scratch: ScratchMemory,
}

impl CommandBuffer {
    pub(crate) fn new(device: ash::Device, handle: vk::CommandBuffer) -> Self {
        Self {
            device,
            handle,
            scratch: ScratchMemory::new(),
        }
    }

    /// Get unsafe access to the underlying command buffer
    /// # Safety
    /// Any vulkan calls that modify the command buffer state may lead to validation errors or put the
    /// system in an undefined state.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }
}

impl CommandRecorder for CommandBuffer {
    fn pipeline_barrier(&mut self, info: &PipelineBarrierInfo<'_>) -> Result<()> {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.handle,
                info.src_stage_mask,
                info.dst_stage_mask,
                info.dependency_flags,
                info.memory_barriers,
                info.buffer_memory_barriers,
                info.image_memory_barriers,
            );
        }
        Ok(())
    }

    fn scratch_memory(&mut self) -> &mut ScratchMemory {
        &mut self.scratch
    }
}
