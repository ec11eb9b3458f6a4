//! Extension structures that can be chained onto barrier descriptors through their `pNext` member.
//!
//! An extension chain is an ordered list of [`VulkanInfo`] objects owned by the barrier. Nothing native exists
//! until the barrier is recorded: at that point every element is serialized into scratch memory and the copies are
//! linked in list order.

use std::ffi::c_void;
use std::fmt::Debug;
use std::mem::size_of;
use std::sync::Arc;

use ash::vk;

use crate::allocator::scratch_memory::ScratchMemory;
use crate::util::pnext;

/// A Vulkan structure that can be placed in a `pNext` chain.
///
/// Implementations usually allocate the native structure with [`ScratchMemory::alloc()`] and hand it back through
/// [`as_base_mut()`](crate::util::pnext::as_base_mut).
/// # Safety
/// The structure returned by [`Self::assign()`] is read by the driver according to its `sType`. It must be the
/// complete native structure identified by that `sType`, allocated from `scratch`, and every pointer inside it other
/// than `pNext` must point into `scratch` or to memory outliving it. Returning a bare `BaseOutStructure` tagged with
/// the `sType` of a larger structure is undefined behaviour.
pub unsafe trait VulkanInfo: Debug + Send + Sync {
    /// Serialize this structure, and any arrays it points to, into scratch memory. Its `pNext` member is overwritten
    /// when the chain is linked.
    fn assign<'s>(&self, scratch: &'s ScratchMemory) -> &'s mut vk::BaseOutStructure;

    /// Upper bound on the number of scratch bytes [`Self::assign()`] uses, used to size scratch memory up front.
    fn scratch_size(&self) -> usize {
        64
    }
}

/// Ordered, heterogeneous `pNext` chain of a barrier descriptor.
pub type InfoChain = Vec<Arc<dyn VulkanInfo>>;

/// Serialize every element of a chain into scratch memory and link them in order.
/// Returns the pointer to store in the owning structure's `pNext`, null for an empty chain.
pub(crate) fn serialize_chain(chain: &[Arc<dyn VulkanInfo>], scratch: &ScratchMemory) -> *const c_void {
    pnext::link(chain.iter().map(|info| info.assign(scratch)))
}

pub(crate) fn chain_scratch_size(chain: &[Arc<dyn VulkanInfo>]) -> usize {
    chain.iter().map(|info| info.scratch_size()).sum()
}

/// Custom sample locations for an image barrier on a depth/stencil image created with
/// `VK_IMAGE_CREATE_SAMPLE_LOCATIONS_COMPATIBLE_DEPTH_BIT_EXT`.
/// Serializes to [`VkSampleLocationsInfoEXT`](vk::SampleLocationsInfoEXT).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleLocations {
    /// Number of sample locations per pixel.
    pub sample_locations_per_pixel: vk::SampleCountFlags,
    /// Size of the pixel grid the sample locations apply to.
    pub sample_location_grid_size: vk::Extent2D,
    /// Sample positions in `[0, 1)` pixel space.
    pub sample_locations: Vec<[f32; 2]>,
}

impl Default for SampleLocations {
    fn default() -> Self {
        Self {
            sample_locations_per_pixel: vk::SampleCountFlags::TYPE_1,
            sample_location_grid_size: vk::Extent2D::default(),
            sample_locations: Vec::new(),
        }
    }
}

// SAFETY: Serializes a complete VkSampleLocationsInfoEXT whose location array lives in the same scratch memory.
unsafe impl VulkanInfo for SampleLocations {
    fn assign<'s>(&self, scratch: &'s ScratchMemory) -> &'s mut vk::BaseOutStructure {
        let locations = scratch.alloc_slice_fill_iter(
            self.sample_locations
                .iter()
                .map(|&[x, y]| vk::SampleLocationEXT {
                    x,
                    y,
                }),
        );
        let info = scratch.alloc(vk::SampleLocationsInfoEXT {
            s_type: vk::StructureType::SAMPLE_LOCATIONS_INFO_EXT,
            p_next: std::ptr::null(),
            sample_locations_per_pixel: self.sample_locations_per_pixel,
            sample_location_grid_size: self.sample_location_grid_size,
            sample_locations_count: locations.len() as u32,
            p_sample_locations: locations.as_ptr(),
        });
        // SAFETY: VkSampleLocationsInfoEXT starts with the sType/pNext header.
        unsafe { pnext::as_base_mut(info) }
    }

    fn scratch_size(&self) -> usize {
        size_of::<vk::SampleLocationsInfoEXT>() + self.sample_locations.len() * size_of::<vk::SampleLocationEXT>() + 16
    }
}
