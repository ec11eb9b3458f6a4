//! Graphics pipelines and the state command binding them.
//!
//! A [`GraphicsPipeline`] is compiled lazily, once for every render pass it is encountered in. The fixed-function
//! state it is created with is merged from the pipeline state fragments on the compile context and its own, see
//! [`pipeline_state`](crate::state::pipeline_state).
//!
//! # Example
//! ```
//! # use std::ffi::CString;
//! # use std::sync::Arc;
//! # use deimos::prelude::*;
//! fn make_pipeline(layout: vk::PipelineLayout, vertex: vk::ShaderModule, fragment: vk::ShaderModule) -> BindGraphicsPipeline {
//!     let stages = vec![
//!         ShaderStage::new(vk::ShaderStageFlags::VERTEX, vertex, CString::new("main").unwrap()),
//!         ShaderStage::new(vk::ShaderStageFlags::FRAGMENT, fragment, CString::new("main").unwrap()),
//!     ];
//!     let pipeline = GraphicsPipeline::new(layout, stages)
//!         .state(VertexInputState::new().binding(0, 12).attribute(0, 0, vk::Format::R32G32B32_SFLOAT, 0))
//!         .state(DepthStencilState::default());
//!     BindGraphicsPipeline::new(Arc::new(pipeline))
//! }
//! ```

use std::ffi::CString;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;

use crate::core::device::DeviceInterface;
use crate::core::error::Error;
use crate::state::pipeline_state::{PipelineState, PipelineStateInfo};
use crate::state::StateCommand;
use crate::traversal::compile::CompileContext;

/// A single shader stage of a pipeline.
#[derive(Debug, Clone)]
pub struct ShaderStage {
    pub stage: vk::ShaderStageFlags,
    pub module: vk::ShaderModule,
    pub entry_point: CString,
}

impl ShaderStage {
    pub fn new(stage: vk::ShaderStageFlags, module: vk::ShaderModule, entry_point: CString) -> Self {
        Self {
            stage,
            module,
            entry_point,
        }
    }
}

/// Everything needed to create a graphics pipeline, handed to [`DeviceInterface::create_graphics_pipeline()`].
#[derive(Debug, Clone)]
pub struct GraphicsPipelineInfo<'a> {
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
    pub stages: &'a [ShaderStage],
    pub state: PipelineStateInfo,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct CompiledPipeline {
    #[derivative(Debug = "ignore")]
    device: Arc<dyn DeviceInterface>,
    device_handle: vk::Device,
    render_pass: vk::RenderPass,
    samples: vk::SampleCountFlags,
    handle: vk::Pipeline,
}

/// A graphics pipeline, compiled once per device and render pass.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GraphicsPipeline {
    layout: vk::PipelineLayout,
    subpass: u32,
    stages: Vec<ShaderStage>,
    states: Vec<Arc<dyn PipelineState>>,
    compiled: Mutex<Vec<CompiledPipeline>>,
}

impl GraphicsPipeline {
    /// Create an uncompiled pipeline with the given layout and shader stages.
    pub fn new(layout: vk::PipelineLayout, stages: Vec<ShaderStage>) -> Self {
        Self {
            layout,
            subpass: 0,
            stages,
            states: vec![],
            compiled: Mutex::new(vec![]),
        }
    }

    /// Add a pipeline state fragment. Fragments are applied in the order they are added.
    pub fn state(mut self, state: impl PipelineState + 'static) -> Self {
        self.states.push(Arc::new(state));
        self
    }

    /// Set the subpass of the render pass this pipeline is used in.
    pub fn subpass(mut self, subpass: u32) -> Self {
        self.subpass = subpass;
        self
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Get the pipeline handle compiled for a render pass, if any.
    pub fn handle(&self, render_pass: vk::RenderPass) -> Option<vk::Pipeline> {
        let compiled = self.compiled.lock().ok()?;
        compiled
            .iter()
            .find(|pipeline| pipeline.render_pass == render_pass)
            .map(|pipeline| pipeline.handle)
    }

    /// Merge the pipeline state for the current render pass of the context. Defaults are applied first, then this
    /// pipeline's fragments, then the context overrides.
    pub fn merged_state(&self, ctx: &CompileContext) -> PipelineStateInfo {
        let mut info = PipelineStateInfo::default();
        ctx.default_pipeline_states
            .iter()
            .chain(self.states.iter())
            .chain(ctx.override_pipeline_states.iter())
            .for_each(|state| state.apply(&mut info));
        info
    }

    /// Compile this pipeline for the current render pass of the context. Does nothing if it was already compiled
    /// for this device and render pass, except warn when the context now asks for a different sample count.
    /// # Errors
    /// * Fails with [`Error::NoRenderPass`] if the context has no active render pass.
    /// * Fails if the device cannot create the pipeline.
    pub fn compile(&self, ctx: &CompileContext) -> Result<vk::Pipeline> {
        let render_pass = ctx.render_pass.ok_or(Error::NoRenderPass)?;
        let device_handle = ctx.device.handle();
        let mut compiled = self.compiled.lock().map_err(|_| Error::PoisonError)?;
        if let Some(pipeline) = compiled
            .iter()
            .find(|pipeline| pipeline.device_handle == device_handle && pipeline.render_pass == render_pass)
        {
            let samples = self.merged_state(ctx).rasterization_samples;
            if samples != pipeline.samples {
                warn!(
                    "Graphics pipeline {:?} for render pass {render_pass:?} was compiled with {:?} samples, reusing it where {samples:?} are requested",
                    pipeline.handle, pipeline.samples
                );
            }
            return Ok(pipeline.handle);
        }

        let info = GraphicsPipelineInfo {
            layout: self.layout,
            render_pass,
            subpass: self.subpass,
            stages: &self.stages,
            state: self.merged_state(ctx),
        };
        let handle = ctx.device.create_graphics_pipeline(&info)?;
        debug!(
            "Compiled graphics pipeline {handle:?} for render pass {render_pass:?} ({:?} samples)",
            info.state.rasterization_samples
        );
        compiled.push(CompiledPipeline {
            device: ctx.device.clone(),
            device_handle,
            render_pass,
            samples: info.state.rasterization_samples,
            handle,
        });
        Ok(handle)
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        let Ok(compiled) = self.compiled.get_mut() else {
            return;
        };
        for pipeline in compiled.drain(..) {
            pipeline.device.destroy_pipeline(pipeline.handle);
        }
    }
}

/// Binds a graphics pipeline for the subgraph of its state group.
#[derive(Debug, Clone)]
pub struct BindGraphicsPipeline {
    pipeline: Arc<GraphicsPipeline>,
}

impl BindGraphicsPipeline {
    pub fn new(pipeline: Arc<GraphicsPipeline>) -> Self {
        Self {
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Arc<GraphicsPipeline> {
        &self.pipeline
    }
}

impl StateCommand for BindGraphicsPipeline {
    fn slot(&self) -> u32 {
        0
    }

    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        self.pipeline.compile(ctx)?;
        Ok(())
    }
}
