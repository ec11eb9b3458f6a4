#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use deimos::prelude::*;

/// Initialize logging once for the test binary. Use `RUST_LOG=trace` to see traversal output.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Everything the mock device was asked to do.
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub command_pools_created: u32,
    pub command_pools_destroyed: u32,
    /// `(max_sets, sizes)` of every descriptor pool created.
    pub descriptor_pools: Vec<(u32, Vec<vk::DescriptorPoolSize>)>,
    pub descriptor_pools_destroyed: u32,
    pub descriptor_sets_allocated: u32,
    /// `(binding, type, count)` of every descriptor write.
    pub descriptor_writes: Vec<(u32, vk::DescriptorType, u32)>,
    /// Render pass and merged state of every pipeline created.
    pub pipelines: Vec<(vk::RenderPass, PipelineStateInfo)>,
    pub pipelines_destroyed: u32,
}

/// Device that hands out fake handles and records every call.
#[derive(Debug)]
pub struct MockDevice {
    pub log: Mutex<DeviceLog>,
    queue_families: Vec<vk::QueueFlags>,
    remaining_sets: Mutex<HashMap<vk::DescriptorPool, u32>>,
    next_handle: AtomicU64,
}

impl MockDevice {
    /// A device with a single graphics and compute capable queue family.
    pub fn new() -> Arc<Self> {
        Self::with_queue_families(vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER])
    }

    pub fn with_queue_families(queue_families: Vec<vk::QueueFlags>) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(DeviceLog::default()),
            queue_families,
            remaining_sets: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    fn next_raw(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    pub fn num_pipelines(&self) -> usize {
        self.log.lock().unwrap().pipelines.len()
    }

    pub fn num_descriptor_sets(&self) -> u32 {
        self.log.lock().unwrap().descriptor_sets_allocated
    }
}

impl DeviceInterface for MockDevice {
    fn handle(&self) -> vk::Device {
        vk::Device::from_raw(0xdead)
    }

    fn queue_family_index(&self, flags: vk::QueueFlags) -> Option<u32> {
        self.queue_families
            .iter()
            .position(|family| family.contains(flags))
            .map(|index| index as u32)
    }

    fn queue(&self, family_index: u32, _queue_index: u32) -> Result<vk::Queue> {
        if family_index as usize >= self.queue_families.len() {
            anyhow::bail!(Error::Uncategorized("No such queue family"));
        }
        Ok(vk::Queue::from_raw(0x100 + family_index as u64))
    }

    fn create_command_pool(&self, _family_index: u32, _flags: vk::CommandPoolCreateFlags) -> Result<vk::CommandPool> {
        self.log.lock().unwrap().command_pools_created += 1;
        Ok(vk::CommandPool::from_raw(self.next_raw()))
    }

    fn destroy_command_pool(&self, _pool: vk::CommandPool) {
        self.log.lock().unwrap().command_pools_destroyed += 1;
    }

    fn create_descriptor_pool(&self, max_sets: u32, sizes: &[vk::DescriptorPoolSize]) -> Result<vk::DescriptorPool> {
        let pool = vk::DescriptorPool::from_raw(self.next_raw());
        self.log.lock().unwrap().descriptor_pools.push((max_sets, sizes.to_vec()));
        self.remaining_sets.lock().unwrap().insert(pool, max_sets);
        Ok(pool)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.remaining_sets.lock().unwrap().remove(&pool);
        self.log.lock().unwrap().descriptor_pools_destroyed += 1;
    }

    fn allocate_descriptor_set(&self, pool: vk::DescriptorPool, _layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let mut remaining = self.remaining_sets.lock().unwrap();
        let Some(sets) = remaining.get_mut(&pool).filter(|sets| **sets > 0) else {
            anyhow::bail!(Error::VkError(vk::Result::ERROR_OUT_OF_POOL_MEMORY));
        };
        *sets -= 1;
        self.log.lock().unwrap().descriptor_sets_allocated += 1;
        Ok(vk::DescriptorSet::from_raw(self.next_raw()))
    }

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet]) {
        let mut log = self.log.lock().unwrap();
        for write in writes {
            log.descriptor_writes
                .push((write.dst_binding, write.descriptor_type, write.descriptor_count));
        }
    }

    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<'_>) -> Result<vk::Pipeline> {
        self.log
            .lock()
            .unwrap()
            .pipelines
            .push((info.render_pass, info.state.clone()));
        Ok(vk::Pipeline::from_raw(self.next_raw()))
    }

    fn destroy_pipeline(&self, _pipeline: vk::Pipeline) {
        self.log.lock().unwrap().pipelines_destroyed += 1;
    }
}

pub fn as_device(device: &Arc<MockDevice>) -> Arc<dyn DeviceInterface> {
    device.clone()
}

/// Window with a fixed render pass, extent and sample count.
#[derive(Debug)]
pub struct MockWindow {
    pub device: Arc<MockDevice>,
    pub render_pass: vk::RenderPass,
    pub extent: vk::Extent2D,
    pub samples: vk::SampleCountFlags,
}

impl MockWindow {
    pub fn new(device: Arc<MockDevice>, samples: vk::SampleCountFlags) -> Arc<Self> {
        Arc::new(Self {
            device,
            render_pass: vk::RenderPass::from_raw(0x5000),
            extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
            samples,
        })
    }
}

impl Window for MockWindow {
    fn device(&self) -> Result<Arc<dyn DeviceInterface>> {
        Ok(self.device.clone())
    }

    fn render_pass(&self) -> Result<vk::RenderPass> {
        Ok(self.render_pass)
    }

    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn framebuffer_samples(&self) -> vk::SampleCountFlags {
        self.samples
    }
}

pub fn make_context(device: &Arc<MockDevice>) -> CompileContext {
    CompileContext::new(as_device(device), BufferPreferences::default())
}

pub fn render_area(width: u32, height: u32) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D::default(),
        extent: vk::Extent2D {
            width,
            height,
        },
    }
}

/// Command recording the context state it was compiled with.
#[derive(Debug, Default)]
pub struct ContextProbe {
    pub seen: Mutex<Vec<ContextState>>,
}

impl ContextProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<ContextState> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> ContextState {
        self.seen.lock().unwrap().last().cloned().expect("probe was never compiled")
    }
}

impl Node for ContextProbe {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_command(self)
    }
}

impl Command for ContextProbe {
    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        self.seen.lock().unwrap().push(ctx.save_state());
        Ok(())
    }

    fn record(&self, _recorder: &mut dyn CommandRecorder) -> Result<()> {
        Ok(())
    }
}

/// Command that leaves extra pipeline state on the context every time it is compiled.
#[derive(Debug, Default)]
pub struct StatePusher;

impl Node for StatePusher {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_command(self)
    }
}

impl Command for StatePusher {
    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        ctx.default_pipeline_states.push(Arc::new(RasterizationState::default()));
        ctx.override_pipeline_states
            .push(Arc::new(MultisampleState::new(vk::SampleCountFlags::TYPE_16)));
        ctx.render_pass = Some(vk::RenderPass::from_raw(0xbad));
        Ok(())
    }

    fn record(&self, _recorder: &mut dyn CommandRecorder) -> Result<()> {
        Ok(())
    }
}

/// Command whose compile step always fails.
#[derive(Debug, Default)]
pub struct FailingCommand;

impl Node for FailingCommand {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_command(self)
    }
}

impl Command for FailingCommand {
    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        ctx.default_pipeline_states.push(Arc::new(ColorBlendState::default()));
        anyhow::bail!("failing command")
    }

    fn record(&self, _recorder: &mut dyn CommandRecorder) -> Result<()> {
        anyhow::bail!("failing command")
    }
}

/// Vertex array counting how often it was compiled.
#[derive(Debug, Default)]
pub struct CountingArray {
    pub compiled: Mutex<u32>,
}

impl CountingArray {
    pub fn count(&self) -> u32 {
        *self.compiled.lock().unwrap()
    }
}

impl Compile for CountingArray {
    fn compile(&self, _ctx: &mut CompileContext) -> Result<()> {
        *self.compiled.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn graphics_pipeline() -> Arc<GraphicsPipeline> {
    let stages = vec![ShaderStage::new(
        vk::ShaderStageFlags::VERTEX,
        vk::ShaderModule::from_raw(0x700),
        std::ffi::CString::new("main").unwrap(),
    )];
    Arc::new(GraphicsPipeline::new(vk::PipelineLayout::from_raw(0x600), stages))
}

pub fn uniform_descriptor(binding: u32) -> Arc<Descriptor> {
    Arc::new(Descriptor::buffers(
        binding,
        vk::DescriptorType::UNIFORM_BUFFER,
        vec![vk::DescriptorBufferInfo {
            buffer: vk::Buffer::from_raw(0x800 + binding as u64),
            offset: 0,
            range: vk::WHOLE_SIZE,
        }],
    ))
}

pub fn sampler_descriptor(binding: u32, count: usize) -> Arc<Descriptor> {
    Arc::new(Descriptor::images(
        binding,
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        vec![vk::DescriptorImageInfo::default(); count],
    ))
}

pub fn descriptor_set(descriptors: Vec<Arc<Descriptor>>) -> Arc<DescriptorSet> {
    Arc::new(DescriptorSet::new(vk::DescriptorSetLayout::from_raw(0x900), descriptors))
}

pub fn bind_sets(sets: Vec<Arc<DescriptorSet>>) -> Arc<BindDescriptorSets> {
    Arc::new(BindDescriptorSets::new(
        vk::PipelineBindPoint::GRAPHICS,
        vk::PipelineLayout::from_raw(0x600),
        0,
        sets,
    ))
}

/// A structure from a recorded `pNext` chain. Only the header is read for structures other than sample locations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEntry {
    pub s_type: vk::StructureType,
    pub sample_locations_per_pixel: vk::SampleCountFlags,
    pub sample_locations: Vec<[f32; 2]>,
}

/// Copy of a recorded pipeline barrier. Chains are read while the barrier is being recorded, the `p_next` pointers
/// in the copied structures are dangling afterwards.
#[derive(Debug, Clone)]
pub struct RecordedBarrier {
    pub src_stage_mask: vk::PipelineStageFlags,
    pub dst_stage_mask: vk::PipelineStageFlags,
    pub dependency_flags: vk::DependencyFlags,
    pub memory_barriers: Vec<vk::MemoryBarrier>,
    pub buffer_memory_barriers: Vec<vk::BufferMemoryBarrier>,
    pub image_memory_barriers: Vec<vk::ImageMemoryBarrier>,
    pub memory_chains: Vec<Vec<ChainEntry>>,
    pub buffer_chains: Vec<Vec<ChainEntry>>,
    pub image_chains: Vec<Vec<ChainEntry>>,
}

unsafe fn read_chain(mut next: *const c_void) -> Vec<ChainEntry> {
    let mut entries = vec![];
    while !next.is_null() {
        let base = &*(next as *const vk::BaseInStructure);
        let mut entry = ChainEntry {
            s_type: base.s_type,
            sample_locations_per_pixel: vk::SampleCountFlags::empty(),
            sample_locations: vec![],
        };
        if base.s_type == vk::StructureType::SAMPLE_LOCATIONS_INFO_EXT {
            let info = &*(next as *const vk::SampleLocationsInfoEXT);
            entry.sample_locations_per_pixel = info.sample_locations_per_pixel;
            entry.sample_locations = std::slice::from_raw_parts(info.p_sample_locations, info.sample_locations_count as usize)
                .iter()
                .map(|location| [location.x, location.y])
                .collect();
        }
        entries.push(entry);
        next = base.p_next as *const c_void;
    }
    entries
}

/// Record target keeping a copy of everything recorded into it.
#[derive(Debug, Default)]
pub struct MockRecorder {
    pub barriers: Vec<RecordedBarrier>,
    pub fail: bool,
    pub scratch: ScratchMemory,
}

impl CommandRecorder for MockRecorder {
    fn pipeline_barrier(&mut self, info: &PipelineBarrierInfo<'_>) -> Result<()> {
        if self.fail {
            anyhow::bail!("recorder failure");
        }
        let recorded = unsafe {
            RecordedBarrier {
                src_stage_mask: info.src_stage_mask,
                dst_stage_mask: info.dst_stage_mask,
                dependency_flags: info.dependency_flags,
                memory_barriers: info.memory_barriers.to_vec(),
                buffer_memory_barriers: info.buffer_memory_barriers.to_vec(),
                image_memory_barriers: info.image_memory_barriers.to_vec(),
                memory_chains: info.memory_barriers.iter().map(|b| read_chain(b.p_next)).collect(),
                buffer_chains: info.buffer_memory_barriers.iter().map(|b| read_chain(b.p_next)).collect(),
                image_chains: info.image_memory_barriers.iter().map(|b| read_chain(b.p_next)).collect(),
            }
        };
        self.barriers.push(recorded);
        Ok(())
    }

    fn scratch_memory(&mut self) -> &mut ScratchMemory {
        &mut self.scratch
    }
}
