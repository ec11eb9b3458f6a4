use anyhow::Result;
use ash::vk;

use crate::core::device::DeviceInterface;

/// A device queue together with the family it was obtained from. Queue submission is not handled by this crate,
/// the compile context only carries the queue so materializers can schedule their own transfers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Queue {
    handle: vk::Queue,
    family_index: u32,
}

impl Queue {
    /// Fetch the first queue of a queue family from the device.
    /// # Errors
    /// Fails if the device has no such queue family.
    pub fn new(device: &dyn DeviceInterface, family_index: u32) -> Result<Self> {
        let handle = device.queue(family_index, 0)?;
        Ok(Self {
            handle,
            family_index,
        })
    }

    /// Obtain the raw vulkan handle of a queue.
    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    /// The queue family index. Use this as the source or destination family of a queue ownership transfer barrier.
    pub fn family_index(&self) -> u32 {
        self.family_index
    }
}
