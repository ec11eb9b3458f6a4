//! The compile traversal and the context it threads through the scene graph.
//!
//! [`CompileTraversal`] visits every reachable node and materializes its GPU state. Scoping nodes
//! ([`CommandGraph`] bound to a window, [`RenderGraph`]) change the [`CompileContext`] for their subgraph: they set
//! the active render pass, push a default viewport and, for multisampled targets, a multisample override. The
//! context is snapshotted before any change and restored when the subgraph is done, also when compiling it failed.
//!
//! The scene graph may be a DAG, so a node can be compiled more than once. Every compile step must be idempotent.

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::command::{Command, Commands};
use crate::core::command_pool::CommandPool;
use crate::core::device::DeviceInterface;
use crate::core::error::Error;
use crate::core::queue::Queue;
use crate::core::settings::BufferPreferences;
use crate::core::window::Window;
use crate::node::command_graph::CommandGraph;
use crate::node::geometry::Geometry;
use crate::node::render_graph::RenderGraph;
use crate::node::state_group::StateGroup;
use crate::node::{Node, Visitor};
use crate::state::descriptor_pool::DescriptorPool;
use crate::state::pipeline_state::{MultisampleState, PipelineState, ViewportState};
use crate::traversal::descriptor_stats::CollectDescriptorStats;

/// A resource that can materialize itself on the GPU, such as a vertex array.
pub trait Compile: Debug + Send + Sync {
    /// Create the GPU state of this resource. Must be idempotent.
    fn compile(&self, ctx: &mut CompileContext) -> Result<()>;
}

/// Everything compile steps need: the device, where to allocate from, and the pipeline state in effect at the
/// current point of the traversal.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CompileContext {
    #[derivative(Debug = "ignore")]
    pub device: Arc<dyn DeviceInterface>,
    pub command_pool: Option<Arc<CommandPool>>,
    pub graphics_queue: Option<Queue>,
    /// Render pass pipelines are compiled for.
    pub render_pass: Option<vk::RenderPass>,
    /// Pool descriptor sets are allocated from.
    pub descriptor_pool: Option<Arc<DescriptorPool>>,
    /// Applied to every pipeline before its own state.
    pub default_pipeline_states: Vec<Arc<dyn PipelineState>>,
    /// Applied to every pipeline after its own state.
    pub override_pipeline_states: Vec<Arc<dyn PipelineState>>,
    pub buffer_preferences: BufferPreferences,
}

/// Snapshot of the parts of a [`CompileContext`] that scoping nodes change.
///
/// Two snapshots compare equal when they hold the same render pass and the very same state objects in the same order.
#[derive(Debug, Clone)]
pub struct ContextState {
    pub render_pass: Option<vk::RenderPass>,
    pub default_pipeline_states: Vec<Arc<dyn PipelineState>>,
    pub override_pipeline_states: Vec<Arc<dyn PipelineState>>,
}

fn same_states(lhs: &[Arc<dyn PipelineState>], rhs: &[Arc<dyn PipelineState>]) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs)
            .all(|(a, b)| Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ())
}

impl PartialEq for ContextState {
    fn eq(&self, other: &Self) -> bool {
        self.render_pass == other.render_pass
            && same_states(&self.default_pipeline_states, &other.default_pipeline_states)
            && same_states(&self.override_pipeline_states, &other.override_pipeline_states)
    }
}

impl CompileContext {
    /// Create a context with only a device. Command pool, queue, render pass and descriptor pool are left unset.
    pub fn new(device: Arc<dyn DeviceInterface>, buffer_preferences: BufferPreferences) -> Self {
        Self {
            device,
            command_pool: None,
            graphics_queue: None,
            render_pass: None,
            descriptor_pool: None,
            default_pipeline_states: vec![],
            override_pipeline_states: vec![],
            buffer_preferences,
        }
    }

    /// Create a context for compiling a scene rendered into `window`.
    ///
    /// The device and render pass are taken from the window. A command pool is created and the graphics queue fetched
    /// for the first graphics capable queue family. If given, `viewport` becomes a default pipeline state, and a
    /// multisample override is installed when the window framebuffer is multisampled.
    /// # Errors
    /// * Fails with [`Error::NoCapableQueue`] if the device has no graphics queue family.
    /// * Fails if the window cannot provide its device or render pass.
    pub fn from_window(window: &dyn Window, viewport: Option<Arc<ViewportState>>, buffer_preferences: BufferPreferences) -> Result<Self> {
        let device = window.device()?;
        let family = device
            .queue_family_index(vk::QueueFlags::GRAPHICS)
            .ok_or(Error::NoCapableQueue(vk::QueueFlags::GRAPHICS))?;
        let command_pool = CommandPool::new(device.clone(), family, vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)?;
        let graphics_queue = Queue::new(device.as_ref(), family)?;

        let mut ctx = Self::new(device, buffer_preferences);
        ctx.render_pass = Some(window.render_pass()?);
        ctx.command_pool = Some(Arc::new(command_pool));
        ctx.graphics_queue = Some(graphics_queue);
        if let Some(viewport) = viewport {
            ctx.default_pipeline_states.push(viewport);
        }
        let samples = window.framebuffer_samples();
        if samples != vk::SampleCountFlags::TYPE_1 {
            ctx.override_pipeline_states.push(Arc::new(MultisampleState::new(samples)));
        }
        debug!("Created compile context for window (queue family {family}, {samples:?} samples)");
        Ok(ctx)
    }

    /// Snapshot the scoped part of the context.
    pub fn save_state(&self) -> ContextState {
        ContextState {
            render_pass: self.render_pass,
            default_pipeline_states: self.default_pipeline_states.clone(),
            override_pipeline_states: self.override_pipeline_states.clone(),
        }
    }

    /// Restore a snapshot taken with [`Self::save_state()`].
    pub fn restore_state(&mut self, state: ContextState) {
        self.render_pass = state.render_pass;
        self.default_pipeline_states = state.default_pipeline_states;
        self.override_pipeline_states = state.override_pipeline_states;
    }

    /// Create a descriptor pool sized by a descriptor accounting pass and make it the pool descriptor sets are
    /// allocated from. Returns `None` without creating anything when the accounting found no descriptor sets.
    /// # Errors
    /// Fails if the device cannot create the pool.
    pub fn reserve_descriptors(&mut self, stats: &CollectDescriptorStats) -> Result<Option<Arc<DescriptorPool>>> {
        let max_sets = stats.num_descriptor_sets();
        if max_sets == 0 {
            debug!("No descriptor sets to reserve");
            return Ok(None);
        }
        let sizes = stats
            .descriptor_pool_sizes()
            .into_iter()
            .filter(|size| size.descriptor_count > 0)
            .collect::<Vec<_>>();
        let pool = Arc::new(DescriptorPool::new(self.device.clone(), max_sets, sizes)?);
        debug!("Reserved {pool}");
        self.descriptor_pool = Some(pool.clone());
        Ok(Some(pool))
    }
}

/// Visitor materializing the GPU state of a scene graph.
#[derive(Debug)]
pub struct CompileTraversal {
    pub context: CompileContext,
}

impl CompileTraversal {
    pub fn new(context: CompileContext) -> Self {
        Self {
            context,
        }
    }

    /// Compile every node reachable from `root`.
    /// # Errors
    /// The first failing compile step aborts the traversal and its error is returned unchanged. Anything compiled
    /// before it stays valid.
    pub fn compile(&mut self, root: &dyn Node) -> Result<()> {
        root.accept(self)
    }

    /// Compile a scene, first reserving a descriptor pool for it if the context has none.
    pub fn compile_scene(&mut self, root: &dyn Node) -> Result<()> {
        if self.context.descriptor_pool.is_none() {
            let mut stats = CollectDescriptorStats::default();
            root.accept(&mut stats)?;
            debug!(
                "Scene needs {} descriptor sets, up to slot {}: {:?}",
                stats.num_descriptor_sets(),
                stats.max_slot(),
                stats.descriptor_pool_sizes()
            );
            self.context.reserve_descriptors(&stats)?;
        }
        self.compile(root)
    }

    /// Traverse the children of a scoping node with a render pass, viewport and sample count in effect. The context
    /// is restored afterwards whether or not the subgraph compiled.
    fn compile_scoped(
        &mut self,
        node: &dyn Node,
        render_pass: vk::RenderPass,
        viewport: Arc<ViewportState>,
        samples: vk::SampleCountFlags,
    ) -> Result<()> {
        let saved = self.context.save_state();
        self.context.render_pass = Some(render_pass);
        self.context.default_pipeline_states.push(viewport);
        if samples != vk::SampleCountFlags::TYPE_1 {
            self.context
                .override_pipeline_states
                .push(Arc::new(MultisampleState::new(samples)));
        }
        debug!("Entering render pass {render_pass:?} ({samples:?} samples)");

        let result = node.traverse(self);

        self.context.restore_state(saved);
        debug!("Leaving render pass {render_pass:?}");
        result
    }
}

impl Visitor for CompileTraversal {
    fn visit_node(&mut self, node: &dyn Node) -> Result<()> {
        node.traverse(self)
    }

    fn visit_state_group(&mut self, group: &StateGroup) -> Result<()> {
        trace!("Compiling state group with {} state commands", group.state_commands().len());
        group.compile(&mut self.context)?;
        group.traverse(self)
    }

    fn visit_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        trace!("Compiling geometry with {} arrays", geometry.arrays().len());
        geometry.compile(&mut self.context)?;
        geometry.traverse(self)
    }

    fn visit_commands(&mut self, commands: &Commands) -> Result<()> {
        Command::compile(commands, &mut self.context)
    }

    fn visit_command_graph(&mut self, graph: &CommandGraph) -> Result<()> {
        let Some(window) = graph.window() else {
            return graph.traverse(self);
        };
        let render_pass = window.render_pass()?;
        let viewport = Arc::new(ViewportState::from_extent(window.extent()));
        self.compile_scoped(graph, render_pass, viewport, window.framebuffer_samples())
    }

    fn visit_render_graph(&mut self, graph: &RenderGraph) -> Result<()> {
        let render_pass = graph.render_pass()?;
        let viewport = match graph.camera_viewport() {
            Some(viewport) => viewport.clone(),
            None => Arc::new(ViewportState::from_rect(graph.render_area())),
        };
        self.compile_scoped(graph, render_pass, viewport, graph.sample_count())
    }

    fn visit_command(&mut self, command: &dyn Command) -> Result<()> {
        command.compile(&mut self.context)
    }
}
