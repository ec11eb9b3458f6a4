use ash::vk;

/// Descriptor usage declared up front for a subgraph. Attach these to a node whose subgraph is not fully visible to a
/// traversal, for example because parts of it are paged in later. Descriptor accounting takes the hint as the
/// total for the node's subgraph and does not look below the node.
///
/// # Example
/// ```
/// # use deimos::prelude::*;
/// let hints = ResourceHints::new()
///     .max_slot(1)
///     .descriptor_sets(64)
///     .pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 128)
///     .pool_size(vk::DescriptorType::UNIFORM_BUFFER, 64);
/// let group = Group::new().with_hints(hints);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceHints {
    /// Highest state command slot used in the subgraph.
    pub max_slot: u32,
    /// Number of descriptor sets the subgraph allocates.
    pub num_descriptor_sets: u32,
    /// Number of descriptors the subgraph allocates, per type.
    pub descriptor_pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl ResourceHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highest slot used in the subgraph.
    pub fn max_slot(mut self, slot: u32) -> Self {
        self.max_slot = slot;
        self
    }

    /// Set the number of descriptor sets used in the subgraph.
    pub fn descriptor_sets(mut self, count: u32) -> Self {
        self.num_descriptor_sets = count;
        self
    }

    /// Declare `count` descriptors of type `ty`.
    pub fn pool_size(mut self, ty: vk::DescriptorType, count: u32) -> Self {
        self.descriptor_pool_sizes.push(vk::DescriptorPoolSize {
            ty,
            descriptor_count: count,
        });
        self
    }
}
