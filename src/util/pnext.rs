//! Utilities for dealing with generic pNext chains

use std::ffi::c_void;

use ash::vk;

/// View any extensible Vulkan structure through its common header. This is how
/// [`VulkanInfo`](crate::sync::extension::VulkanInfo) implementations return the structure they serialized.
/// # Safety
/// `T` must be a Vulkan structure starting with `sType` and `pNext`, as all `ash::vk` structures that can appear in
/// a pNext chain do.
pub unsafe fn as_base_mut<T>(value: &mut T) -> &mut vk::BaseOutStructure {
    &mut *(value as *mut T as *mut vk::BaseOutStructure)
}

/// Link a sequence of already serialized structures in iteration order, and return the head of the resulting chain.
/// Returns a null pointer for an empty sequence.
pub(crate) fn link<'s>(structures: impl IntoIterator<Item = &'s mut vk::BaseOutStructure>) -> *const c_void {
    let mut head: *mut vk::BaseOutStructure = std::ptr::null_mut();
    let mut tail: Option<&'s mut vk::BaseOutStructure> = None;
    for structure in structures {
        structure.p_next = std::ptr::null_mut();
        let ptr: *mut vk::BaseOutStructure = &mut *structure;
        match tail {
            None => head = ptr,
            Some(previous) => previous.p_next = ptr,
        }
        tail = Some(structure);
    }
    head as *const c_void
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_in_order() {
        let mut first = vk::SampleLocationsInfoEXT::default();
        let mut second = vk::SampleLocationsInfoEXT::default();
        let second_ptr = &second as *const vk::SampleLocationsInfoEXT as *const c_void;
        let head = unsafe { link([as_base_mut(&mut first), as_base_mut(&mut second)]) };
        assert_eq!(head, &first as *const vk::SampleLocationsInfoEXT as *const c_void);
        assert_eq!(first.p_next, second_ptr);
        assert!(second.p_next.is_null());
    }

    #[test]
    fn empty_chain_is_null() {
        assert!(link(std::iter::empty()).is_null());
    }
}
