//! Descriptors, descriptor sets and the state command binding them.
//!
//! Descriptor sets are shared between state groups through `Arc`. A set is allocated from the descriptor pool of the
//! compile context the first time it is compiled, which is why the pool should be sized by running
//! [`CollectDescriptorStats`](crate::traversal::descriptor_stats::CollectDescriptorStats) over the scene first.
//!
//! # Example
//! ```
//! # use std::sync::Arc;
//! # use deimos::prelude::*;
//! fn bind_material(layout: vk::PipelineLayout, set_layout: vk::DescriptorSetLayout, ubo: vk::Buffer) -> BindDescriptorSets {
//!     let uniforms = Descriptor::buffers(0, vk::DescriptorType::UNIFORM_BUFFER, vec![vk::DescriptorBufferInfo {
//!         buffer: ubo,
//!         offset: 0,
//!         range: vk::WHOLE_SIZE,
//!     }]);
//!     let set = DescriptorSet::new(set_layout, vec![Arc::new(uniforms)]);
//!     BindDescriptorSets::new(vk::PipelineBindPoint::GRAPHICS, layout, 0, vec![Arc::new(set)])
//! }
//! ```

use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::node::Visitor;
use crate::state::descriptor_pool::DescriptorPool;
use crate::state::StateCommand;
use crate::traversal::compile::CompileContext;

/// Resources referenced by a descriptor binding.
#[derive(Debug, Clone)]
pub enum DescriptorContents {
    Buffers(Vec<vk::DescriptorBufferInfo>),
    Images(Vec<vk::DescriptorImageInfo>),
    TexelBufferViews(Vec<vk::BufferView>),
}

/// One binding of a descriptor set.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub binding: u32,
    pub array_element: u32,
    pub ty: vk::DescriptorType,
    pub contents: DescriptorContents,
}

impl Descriptor {
    /// Bind an array of buffers, starting at array element 0.
    pub fn buffers(binding: u32, ty: vk::DescriptorType, buffers: Vec<vk::DescriptorBufferInfo>) -> Self {
        Self {
            binding,
            array_element: 0,
            ty,
            contents: DescriptorContents::Buffers(buffers),
        }
    }

    /// Bind an array of images, starting at array element 0.
    pub fn images(binding: u32, ty: vk::DescriptorType, images: Vec<vk::DescriptorImageInfo>) -> Self {
        Self {
            binding,
            array_element: 0,
            ty,
            contents: DescriptorContents::Images(images),
        }
    }

    /// Bind an array of texel buffer views, starting at array element 0.
    pub fn texel_buffer_views(binding: u32, ty: vk::DescriptorType, views: Vec<vk::BufferView>) -> Self {
        Self {
            binding,
            array_element: 0,
            ty,
            contents: DescriptorContents::TexelBufferViews(views),
        }
    }

    /// Start writing at a different array element of the binding.
    pub fn array_element(mut self, element: u32) -> Self {
        self.array_element = element;
        self
    }

    /// Number of descriptors this binding writes.
    pub fn num_descriptors(&self) -> u32 {
        match &self.contents {
            DescriptorContents::Buffers(buffers) => buffers.len() as u32,
            DescriptorContents::Images(images) => images.len() as u32,
            DescriptorContents::TexelBufferViews(views) => views.len() as u32,
        }
    }

    fn write(&self, set: vk::DescriptorSet) -> vk::WriteDescriptorSet {
        let mut write = vk::WriteDescriptorSet {
            s_type: vk::StructureType::WRITE_DESCRIPTOR_SET,
            p_next: std::ptr::null(),
            dst_set: set,
            dst_binding: self.binding,
            dst_array_element: self.array_element,
            descriptor_count: self.num_descriptors(),
            descriptor_type: self.ty,
            p_image_info: std::ptr::null(),
            p_buffer_info: std::ptr::null(),
            p_texel_buffer_view: std::ptr::null(),
        };
        match &self.contents {
            DescriptorContents::Buffers(buffers) => write.p_buffer_info = buffers.as_ptr(),
            DescriptorContents::Images(images) => write.p_image_info = images.as_ptr(),
            DescriptorContents::TexelBufferViews(views) => write.p_texel_buffer_view = views.as_ptr(),
        }
        write
    }
}

#[derive(Debug)]
struct CompiledSet {
    // Keeps the pool alive for as long as the set exists. Sets are freed together with their pool.
    pool: Arc<DescriptorPool>,
    handle: vk::DescriptorSet,
}

/// A descriptor set with a fixed layout. Identity, not contents, determines whether two sets are the same set.
#[derive(Debug)]
pub struct DescriptorSet {
    layout: vk::DescriptorSetLayout,
    descriptors: Vec<Arc<Descriptor>>,
    compiled: Mutex<Option<CompiledSet>>,
}

impl DescriptorSet {
    pub fn new(layout: vk::DescriptorSetLayout, descriptors: Vec<Arc<Descriptor>>) -> Self {
        Self {
            layout,
            descriptors,
            compiled: Mutex::new(None),
        }
    }

    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub fn descriptors(&self) -> &[Arc<Descriptor>] {
        &self.descriptors
    }

    /// Get the allocated set, if this set was compiled.
    pub fn handle(&self) -> Option<vk::DescriptorSet> {
        let compiled = self.compiled.lock().ok()?;
        compiled.as_ref().map(|set| set.handle)
    }

    /// Get the pool this set was allocated from, if it was compiled.
    pub fn pool(&self) -> Option<Arc<DescriptorPool>> {
        let compiled = self.compiled.lock().ok()?;
        compiled.as_ref().map(|set| set.pool.clone())
    }

    /// Allocate this set from the context's descriptor pool and write its descriptors. Does nothing if it was
    /// already compiled.
    /// # Errors
    /// * Fails with [`Error::NoDescriptorPool`] if the context has no descriptor pool.
    /// * Fails if the pool is exhausted.
    pub fn compile(&self, ctx: &CompileContext) -> Result<vk::DescriptorSet> {
        let mut compiled = self.compiled.lock().map_err(|_| Error::PoisonError)?;
        if let Some(set) = compiled.as_ref() {
            return Ok(set.handle);
        }

        let pool = ctx.descriptor_pool.clone().ok_or(Error::NoDescriptorPool)?;
        let handle = ctx.device.allocate_descriptor_set(pool.handle(), self.layout)?;
        let writes = self
            .descriptors
            .iter()
            .filter(|descriptor| descriptor.num_descriptors() > 0)
            .map(|descriptor| descriptor.write(handle))
            .collect::<Vec<_>>();
        ctx.device.update_descriptor_sets(&writes);
        trace!("Allocated descriptor set {handle:?} with {} writes", writes.len());

        *compiled = Some(CompiledSet {
            pool,
            handle,
        });
        Ok(handle)
    }

    /// Visit every descriptor of this set.
    pub fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        for descriptor in &self.descriptors {
            visitor.visit_descriptor(descriptor)?;
        }
        Ok(())
    }
}

/// Binds one or more consecutive descriptor sets for the subgraph of its state group.
#[derive(Debug, Clone)]
pub struct BindDescriptorSets {
    pub bind_point: vk::PipelineBindPoint,
    pub layout: vk::PipelineLayout,
    pub first_set: u32,
    pub sets: Vec<Arc<DescriptorSet>>,
}

impl BindDescriptorSets {
    pub fn new(bind_point: vk::PipelineBindPoint, layout: vk::PipelineLayout, first_set: u32, sets: Vec<Arc<DescriptorSet>>) -> Self {
        Self {
            bind_point,
            layout,
            first_set,
            sets,
        }
    }
}

impl StateCommand for BindDescriptorSets {
    fn slot(&self) -> u32 {
        1
    }

    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        for set in &self.sets {
            set.compile(ctx)?;
        }
        Ok(())
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        for set in &self.sets {
            visitor.visit_descriptor_set(set)?;
        }
        Ok(())
    }
}
