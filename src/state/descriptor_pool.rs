//! A fixed-size descriptor pool. Vulkan pools cannot grow, so the size is usually predicted by running
//! [`CollectDescriptorStats`](crate::traversal::descriptor_stats::CollectDescriptorStats) over the scene first.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::device::DeviceInterface;

/// Memory pool for descriptor sets
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorPool {
    #[derivative(Debug = "ignore")]
    device: Arc<dyn DeviceInterface>,
    handle: vk::DescriptorPool,
    max_sets: u32,
    sizes: Vec<vk::DescriptorPoolSize>,
}

impl DescriptorPool {
    /// Create a new descriptor pool holding at most `max_sets` sets and the given number of descriptors per type.
    /// # Errors
    /// Fails if the device cannot create the pool.
    pub fn new(device: Arc<dyn DeviceInterface>, max_sets: u32, sizes: Vec<vk::DescriptorPoolSize>) -> Result<Self> {
        let handle = device.create_descriptor_pool(max_sets, sizes.as_slice())?;
        Ok(Self {
            device,
            handle,
            max_sets,
            sizes,
        })
    }

    /// Get the raw Vulkan handle of this descriptor pool
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }

    /// Maximum number of sets that can be allocated from this pool.
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    /// Number of descriptors of each type this pool was created with.
    pub fn sizes(&self) -> &[vk::DescriptorPoolSize] {
        &self.sizes
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        self.device.destroy_descriptor_pool(self.handle);
    }
}

impl Display for DescriptorPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DescriptorPool ({} sets", self.max_sets)?;
        for size in &self.sizes {
            writeln!(f, "{:?} => {}", size.ty, size.descriptor_count)?;
        }
        write!(f, ")")
    }
}
