//! The device seam used by compilation. Everything a node needs to materialize itself on the GPU goes through
//! [`DeviceInterface`], so the traversals never depend on how the logical device was created.

use anyhow::Result;
use ash::vk;

use crate::command::recorder::CommandBuffer;
use crate::core::error::Error;
use crate::state::pipeline::GraphicsPipelineInfo;

/// Operations a compile context performs on a logical device.
pub trait DeviceInterface: Send + Sync {
    /// Get the raw handle of the logical device.
    fn handle(&self) -> vk::Device;
    /// Find the first queue family supporting all of the given flags.
    fn queue_family_index(&self, flags: vk::QueueFlags) -> Option<u32>;
    /// Obtain a queue from a queue family.
    /// # Errors
    /// Fails if the family does not exist on this device.
    fn queue(&self, family_index: u32, queue_index: u32) -> Result<vk::Queue>;
    /// Create a command pool for the given queue family.
    fn create_command_pool(&self, family_index: u32, flags: vk::CommandPoolCreateFlags) -> Result<vk::CommandPool>;
    /// Destroy a command pool created through [`Self::create_command_pool()`].
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    /// Create a fixed-size descriptor pool.
    fn create_descriptor_pool(&self, max_sets: u32, sizes: &[vk::DescriptorPoolSize]) -> Result<vk::DescriptorPool>;
    /// Destroy a descriptor pool, freeing every set allocated from it.
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    /// Allocate a single descriptor set with the given layout.
    fn allocate_descriptor_set(&self, pool: vk::DescriptorPool, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet>;
    /// Write descriptors into allocated sets.
    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet]);
    /// Create a graphics pipeline from a fully merged pipeline description.
    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<'_>) -> Result<vk::Pipeline>;
    /// Destroy a pipeline created through [`Self::create_graphics_pipeline()`].
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);
}

/// [`DeviceInterface`] implementation over a loaded `ash::Device`. Device creation itself is left to the application,
/// this only needs the loaded function table and the queue family properties of the physical device it was created from.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct LogicalDevice {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    queue_families: Vec<vk::QueueFamilyProperties>,
}

impl LogicalDevice {
    /// Wrap a loaded logical device.
    pub fn new(handle: ash::Device, queue_families: Vec<vk::QueueFamilyProperties>) -> Self {
        Self {
            handle,
            queue_families,
        }
    }

    /// Wrap a command buffer in the recording state allocated from this device so commands can be recorded into it.
    /// # Safety
    /// The command buffer must have been allocated from this device and must be in the recording state.
    pub unsafe fn command_buffer(&self, handle: vk::CommandBuffer) -> CommandBuffer {
        CommandBuffer::new(self.handle.clone(), handle)
    }
}

impl DeviceInterface for LogicalDevice {
    fn handle(&self) -> vk::Device {
        self.handle.handle()
    }

    fn queue_family_index(&self, flags: vk::QueueFlags) -> Option<u32> {
        self.queue_families
            .iter()
            .position(|family| family.queue_count > 0 && family.queue_flags.contains(flags))
            .map(|index| index as u32)
    }

    fn queue(&self, family_index: u32, queue_index: u32) -> Result<vk::Queue> {
        let family = self
            .queue_families
            .get(family_index as usize)
            .ok_or(Error::Uncategorized("Queue family index out of range"))?;
        if queue_index >= family.queue_count {
            anyhow::bail!(Error::Uncategorized("Queue index out of range"));
        }
        // SAFETY: Both indices were validated against the queue family properties above.
        Ok(unsafe { self.handle.get_device_queue(family_index, queue_index) })
    }

    fn create_command_pool(&self, family_index: u32, flags: vk::CommandPoolCreateFlags) -> Result<vk::CommandPool> {
        let info = vk::CommandPoolCreateInfo {
            s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
            p_next: std::ptr::null(),
            flags,
            queue_family_index: family_index,
        };
        let handle = unsafe { self.handle.create_command_pool(&info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkCommandPool {handle:p}");
        Ok(handle)
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkCommandPool {pool:p}");
        unsafe { self.handle.destroy_command_pool(pool, None) }
    }

    fn create_descriptor_pool(&self, max_sets: u32, sizes: &[vk::DescriptorPoolSize]) -> Result<vk::DescriptorPool> {
        let info = vk::DescriptorPoolCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_POOL_CREATE_INFO,
            p_next: std::ptr::null(),
            flags: vk::DescriptorPoolCreateFlags::empty(),
            max_sets,
            pool_size_count: sizes.len() as u32,
            p_pool_sizes: sizes.as_ptr(),
        };
        let handle = unsafe { self.handle.create_descriptor_pool(&info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDescriptorPool {handle:p}");
        Ok(handle)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDescriptorPool {pool:p}");
        unsafe { self.handle.destroy_descriptor_pool(pool, None) }
    }

    fn allocate_descriptor_set(&self, pool: vk::DescriptorPool, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let info = vk::DescriptorSetAllocateInfo {
            s_type: vk::StructureType::DESCRIPTOR_SET_ALLOCATE_INFO,
            p_next: std::ptr::null(),
            descriptor_pool: pool,
            descriptor_set_count: 1,
            p_set_layouts: &layout,
        };
        let sets = unsafe { self.handle.allocate_descriptor_sets(&info)? };
        Ok(sets
            .first()
            .copied()
            .ok_or(Error::Uncategorized("Descriptor set allocation returned no sets"))?)
    }

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet]) {
        unsafe { self.handle.update_descriptor_sets(writes, &[]) }
    }

    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<'_>) -> Result<vk::Pipeline> {
        let state = &info.state;
        let stages = info
            .stages
            .iter()
            .map(|stage| {
                vk::PipelineShaderStageCreateInfo::builder()
                    .stage(stage.stage)
                    .module(stage.module)
                    .name(stage.entry_point.as_c_str())
                    .build()
            })
            .collect::<Vec<_>>();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(state.vertex_bindings.as_slice())
            .vertex_attribute_descriptions(state.vertex_attributes.as_slice())
            .build();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(state.topology)
            .primitive_restart_enable(state.primitive_restart)
            .build();
        let viewport = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(state.viewports.as_slice())
            .scissors(state.scissors.as_slice())
            .build();
        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .polygon_mode(state.polygon_mode)
            .cull_mode(state.cull_mode)
            .front_face(state.front_face)
            .line_width(state.line_width)
            .build();
        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(state.rasterization_samples)
            .sample_shading_enable(state.sample_shading)
            .min_sample_shading(state.min_sample_shading)
            .build();
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(state.depth_test)
            .depth_write_enable(state.depth_write)
            .depth_compare_op(state.depth_compare_op)
            .build();
        let color_blend = vk::PipelineColorBlendStateCreateInfo::builder()
            .attachments(state.blend_attachments.as_slice())
            .build();

        let create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(stages.as_slice())
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .layout(info.layout)
            .render_pass(info.render_pass)
            .subpass(info.subpass)
            .build();

        let pipelines = unsafe {
            self.handle
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&create_info), None)
                .map_err(Error::from)?
        };
        let handle = pipelines
            .first()
            .copied()
            .ok_or(Error::Uncategorized("Pipeline creation returned no pipelines"))?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkPipeline {handle:p}");
        Ok(handle)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkPipeline {pipeline:p}");
        unsafe { self.handle.destroy_pipeline(pipeline, None) }
    }
}
