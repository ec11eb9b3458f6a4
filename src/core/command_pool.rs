use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::device::DeviceInterface;

/// Owned `VkCommandPool`, destroyed when dropped.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CommandPool {
    #[derivative(Debug = "ignore")]
    device: Arc<dyn DeviceInterface>,
    handle: vk::CommandPool,
    family_index: u32,
}

impl CommandPool {
    /// Create a new command pool for a queue family.
    /// # Errors
    /// Fails if the device fails to create the pool.
    pub fn new(device: Arc<dyn DeviceInterface>, family_index: u32, flags: vk::CommandPoolCreateFlags) -> Result<Self> {
        let handle = device.create_command_pool(family_index, flags)?;
        Ok(CommandPool {
            device,
            handle,
            family_index,
        })
    }

    /// Get the raw vulkan handle of the pool.
    pub fn handle(&self) -> vk::CommandPool {
        self.handle
    }

    /// The queue family command buffers from this pool can be submitted to.
    pub fn family_index(&self) -> u32 {
        self.family_index
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        self.device.destroy_command_pool(self.handle);
    }
}
