//! Barrier descriptors. These are plain values built right before recording a
//! [`PipelineBarrier`](crate::sync::pipeline_barrier::PipelineBarrier); they are only converted to their native form
//! while the barrier is being recorded.
//!
//! No validation is done here. Inconsistent layout or queue family combinations are passed on as given and are
//! reported by the validation layers at submission time.

use std::mem::size_of;
use std::sync::Arc;

use ash::vk;

use crate::allocator::scratch_memory::ScratchMemory;
use crate::sync::extension::{chain_scratch_size, serialize_chain, InfoChain, VulkanInfo};

/// Global memory barrier. Serializes to [`VkMemoryBarrier`](vk::MemoryBarrier).
#[derive(Debug, Clone, Default)]
pub struct MemoryBarrier {
    /// Extension structures chained to this barrier.
    pub next: InfoChain,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
}

/// Barrier on a byte range of a buffer. Serializes to [`VkBufferMemoryBarrier`](vk::BufferMemoryBarrier).
#[derive(Debug, Clone)]
pub struct BufferMemoryBarrier {
    /// Extension structures chained to this barrier.
    pub next: InfoChain,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
    /// Source queue family of an ownership transfer, or `vk::QUEUE_FAMILY_IGNORED`.
    pub src_queue_family_index: u32,
    /// Destination queue family of an ownership transfer, or `vk::QUEUE_FAMILY_IGNORED`.
    pub dst_queue_family_index: u32,
    pub buffer: vk::Buffer,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

/// Barrier on a subresource range of an image, optionally transitioning its layout.
/// Serializes to [`VkImageMemoryBarrier`](vk::ImageMemoryBarrier).
#[derive(Debug, Clone)]
pub struct ImageMemoryBarrier {
    /// Extension structures chained to this barrier.
    pub next: InfoChain,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    /// Source queue family of an ownership transfer, or `vk::QUEUE_FAMILY_IGNORED`.
    pub src_queue_family_index: u32,
    /// Destination queue family of an ownership transfer, or `vk::QUEUE_FAMILY_IGNORED`.
    pub dst_queue_family_index: u32,
    pub image: vk::Image,
    /// Affected subresources. The all-zero default is accepted as is.
    pub subresource_range: vk::ImageSubresourceRange,
}

impl Default for BufferMemoryBarrier {
    fn default() -> Self {
        Self {
            next: InfoChain::new(),
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::empty(),
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: vk::Buffer::null(),
            offset: 0,
            size: vk::WHOLE_SIZE,
        }
    }
}

impl Default for ImageMemoryBarrier {
    fn default() -> Self {
        Self {
            next: InfoChain::new(),
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::empty(),
            old_layout: vk::ImageLayout::UNDEFINED,
            new_layout: vk::ImageLayout::UNDEFINED,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: vk::Image::null(),
            subresource_range: vk::ImageSubresourceRange::default(),
        }
    }
}

impl MemoryBarrier {
    /// Create a global memory barrier between two access scopes.
    pub fn new(src_access_mask: vk::AccessFlags, dst_access_mask: vk::AccessFlags) -> Self {
        Self {
            next: InfoChain::new(),
            src_access_mask,
            dst_access_mask,
        }
    }

    /// Append an extension structure to the end of the `pNext` chain.
    pub fn chain(mut self, info: impl VulkanInfo + 'static) -> Self {
        self.next.push(Arc::new(info));
        self
    }

    pub(crate) fn assign(&self, scratch: &ScratchMemory) -> vk::MemoryBarrier {
        vk::MemoryBarrier {
            s_type: vk::StructureType::MEMORY_BARRIER,
            p_next: serialize_chain(&self.next, scratch),
            src_access_mask: self.src_access_mask,
            dst_access_mask: self.dst_access_mask,
        }
    }

    pub(crate) fn scratch_size(&self) -> usize {
        size_of::<vk::MemoryBarrier>() + chain_scratch_size(&self.next)
    }
}

impl BufferMemoryBarrier {
    /// Create a barrier over `size` bytes of `buffer` starting at `offset`, without queue ownership transfer.
    pub fn new(buffer: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        Self {
            buffer,
            offset,
            size,
            ..Default::default()
        }
    }

    /// Set the source and destination access scopes.
    pub fn access(mut self, src_access_mask: vk::AccessFlags, dst_access_mask: vk::AccessFlags) -> Self {
        self.src_access_mask = src_access_mask;
        self.dst_access_mask = dst_access_mask;
        self
    }

    /// Transfer ownership of the buffer range between two queue families.
    pub fn queue_family_transfer(mut self, src_queue_family_index: u32, dst_queue_family_index: u32) -> Self {
        self.src_queue_family_index = src_queue_family_index;
        self.dst_queue_family_index = dst_queue_family_index;
        self
    }

    /// Append an extension structure to the end of the `pNext` chain.
    pub fn chain(mut self, info: impl VulkanInfo + 'static) -> Self {
        self.next.push(Arc::new(info));
        self
    }

    /// Whether this barrier releases or acquires queue family ownership.
    pub fn is_ownership_transfer(&self) -> bool {
        self.src_queue_family_index != self.dst_queue_family_index
    }

    pub(crate) fn assign(&self, scratch: &ScratchMemory) -> vk::BufferMemoryBarrier {
        vk::BufferMemoryBarrier {
            s_type: vk::StructureType::BUFFER_MEMORY_BARRIER,
            p_next: serialize_chain(&self.next, scratch),
            src_access_mask: self.src_access_mask,
            dst_access_mask: self.dst_access_mask,
            src_queue_family_index: self.src_queue_family_index,
            dst_queue_family_index: self.dst_queue_family_index,
            buffer: self.buffer,
            offset: self.offset,
            size: self.size,
        }
    }

    pub(crate) fn scratch_size(&self) -> usize {
        size_of::<vk::BufferMemoryBarrier>() + chain_scratch_size(&self.next)
    }
}

impl ImageMemoryBarrier {
    /// Create a barrier over a subresource range of `image`, without layout transition or queue ownership transfer.
    pub fn new(image: vk::Image, subresource_range: vk::ImageSubresourceRange) -> Self {
        Self {
            image,
            subresource_range,
            ..Default::default()
        }
    }

    /// Set the source and destination access scopes.
    pub fn access(mut self, src_access_mask: vk::AccessFlags, dst_access_mask: vk::AccessFlags) -> Self {
        self.src_access_mask = src_access_mask;
        self.dst_access_mask = dst_access_mask;
        self
    }

    /// Transition the image from `old_layout` to `new_layout`.
    pub fn layout_transition(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.old_layout = old_layout;
        self.new_layout = new_layout;
        self
    }

    /// Transfer ownership of the subresources between two queue families.
    pub fn queue_family_transfer(mut self, src_queue_family_index: u32, dst_queue_family_index: u32) -> Self {
        self.src_queue_family_index = src_queue_family_index;
        self.dst_queue_family_index = dst_queue_family_index;
        self
    }

    /// Append an extension structure to the end of the `pNext` chain.
    pub fn chain(mut self, info: impl VulkanInfo + 'static) -> Self {
        self.next.push(Arc::new(info));
        self
    }

    /// Whether this barrier releases or acquires queue family ownership.
    pub fn is_ownership_transfer(&self) -> bool {
        self.src_queue_family_index != self.dst_queue_family_index
    }

    pub(crate) fn assign(&self, scratch: &ScratchMemory) -> vk::ImageMemoryBarrier {
        vk::ImageMemoryBarrier {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER,
            p_next: serialize_chain(&self.next, scratch),
            src_access_mask: self.src_access_mask,
            dst_access_mask: self.dst_access_mask,
            old_layout: self.old_layout,
            new_layout: self.new_layout,
            src_queue_family_index: self.src_queue_family_index,
            dst_queue_family_index: self.dst_queue_family_index,
            image: self.image,
            subresource_range: self.subresource_range,
        }
    }

    pub(crate) fn scratch_size(&self) -> usize {
        size_of::<vk::ImageMemoryBarrier>() + chain_scratch_size(&self.next)
    }
}
