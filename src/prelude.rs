pub use ash::vk;

pub use crate::core::command_pool::CommandPool;
pub use crate::core::device::{DeviceInterface, LogicalDevice};
pub use crate::core::error::Error;
pub use crate::core::queue::Queue;
pub use crate::core::settings::{BufferPreferences, DescriptorStatsSettings};
pub use crate::core::window::Window;

pub use crate::allocator::scratch_memory::ScratchMemory;

pub use crate::command::recorder::{CommandBuffer, CommandRecorder, PipelineBarrierInfo};
pub use crate::command::{Command, Commands};

pub use crate::node::command_graph::CommandGraph;
pub use crate::node::geometry::Geometry;
pub use crate::node::group::Group;
pub use crate::node::lod::{Lod, LodChild, PagedLod};
pub use crate::node::render_graph::{Camera, RenderGraph};
pub use crate::node::state_group::StateGroup;
pub use crate::node::{Node, Visitor};

pub use crate::state::descriptor::{BindDescriptorSets, Descriptor, DescriptorContents, DescriptorSet};
pub use crate::state::descriptor_pool::DescriptorPool;
pub use crate::state::pipeline::{BindGraphicsPipeline, GraphicsPipeline, GraphicsPipelineInfo, ShaderStage};
pub use crate::state::pipeline_state::*;
pub use crate::state::resource_hints::ResourceHints;
pub use crate::state::StateCommand;

pub use crate::sync::barrier::{BufferMemoryBarrier, ImageMemoryBarrier, MemoryBarrier};
pub use crate::sync::extension::{InfoChain, SampleLocations, VulkanInfo};
pub use crate::sync::pipeline_barrier::PipelineBarrier;

pub use crate::traversal::compile::{Compile, CompileContext, CompileTraversal, ContextState};
pub use crate::traversal::descriptor_stats::CollectDescriptorStats;
