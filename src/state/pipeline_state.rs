//! Fragments of fixed-function graphics pipeline state.
//!
//! A [`GraphicsPipeline`](crate::state::pipeline::GraphicsPipeline) is described by a list of [`PipelineState`]
//! fragments, each owning one part of [`PipelineStateInfo`]. When the pipeline is compiled the fragments are applied
//! in order: first the compile context's defaults, then the pipeline's own fragments, then the context's overrides.
//! Later fragments win, which is how a render graph forces for example its multisample count onto every pipeline
//! compiled below it.

use std::fmt::Debug;

use ash::vk;

/// Merged fixed-function state of a graphics pipeline.
#[derive(Debug, Clone)]
pub struct PipelineStateInfo {
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
    pub viewports: Vec<vk::Viewport>,
    pub scissors: Vec<vk::Rect2D>,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
    pub rasterization_samples: vk::SampleCountFlags,
    pub sample_shading: bool,
    pub min_sample_shading: f32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: vk::CompareOp,
    pub blend_attachments: Vec<vk::PipelineColorBlendAttachmentState>,
}

impl Default for PipelineStateInfo {
    fn default() -> Self {
        Self {
            vertex_bindings: vec![],
            vertex_attributes: vec![],
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart: false,
            viewports: vec![],
            scissors: vec![],
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            line_width: 1.0,
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            sample_shading: false,
            min_sample_shading: 0.0,
            depth_test: true,
            depth_write: true,
            depth_compare_op: vk::CompareOp::GREATER,
            blend_attachments: vec![ColorBlendState::opaque_attachment()],
        }
    }
}

/// One fragment of pipeline state.
pub trait PipelineState: Debug + Send + Sync {
    /// Write this fragment's values into the merged description.
    fn apply(&self, info: &mut PipelineStateInfo);
}

/// Viewports and scissors.
#[derive(Debug, Clone, Default)]
pub struct ViewportState {
    pub viewports: Vec<vk::Viewport>,
    pub scissors: Vec<vk::Rect2D>,
}

impl ViewportState {
    /// A single viewport and scissor covering `extent`, with depth range `[0, 1]`.
    pub fn from_extent(extent: vk::Extent2D) -> Self {
        Self::from_rect(vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        })
    }

    /// A single viewport and scissor covering `rect`, with depth range `[0, 1]`.
    pub fn from_rect(rect: vk::Rect2D) -> Self {
        Self {
            viewports: vec![vk::Viewport {
                x: rect.offset.x as f32,
                y: rect.offset.y as f32,
                width: rect.extent.width as f32,
                height: rect.extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            }],
            scissors: vec![rect],
        }
    }
}

impl PipelineState for ViewportState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.viewports = self.viewports.clone();
        info.scissors = self.scissors.clone();
    }
}

/// Multisampling.
#[derive(Debug, Copy, Clone)]
pub struct MultisampleState {
    pub rasterization_samples: vk::SampleCountFlags,
    pub sample_shading: bool,
    pub min_sample_shading: f32,
}

impl MultisampleState {
    /// Rasterize with `samples` samples per pixel, without sample shading.
    pub fn new(samples: vk::SampleCountFlags) -> Self {
        Self {
            rasterization_samples: samples,
            sample_shading: false,
            min_sample_shading: 0.0,
        }
    }
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self::new(vk::SampleCountFlags::TYPE_1)
    }
}

impl PipelineState for MultisampleState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.rasterization_samples = self.rasterization_samples;
        info.sample_shading = self.sample_shading;
        info.min_sample_shading = self.min_sample_shading;
    }
}

/// Vertex buffer bindings and attributes.
#[derive(Debug, Clone, Default)]
pub struct VertexInputState {
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VertexInputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex buffer binding with the given stride, advanced per vertex.
    pub fn binding(mut self, binding: u32, stride: u32) -> Self {
        self.bindings.push(vk::VertexInputBindingDescription {
            binding,
            stride,
            input_rate: vk::VertexInputRate::VERTEX,
        });
        self
    }

    /// Add an attribute read from `binding` at `offset`.
    pub fn attribute(mut self, location: u32, binding: u32, format: vk::Format, offset: u32) -> Self {
        self.attributes.push(vk::VertexInputAttributeDescription {
            location,
            binding,
            format,
            offset,
        });
        self
    }
}

impl PipelineState for VertexInputState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.vertex_bindings = self.bindings.clone();
        info.vertex_attributes = self.attributes.clone();
    }
}

#[derive(Debug, Copy, Clone)]
pub struct InputAssemblyState {
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
}

impl Default for InputAssemblyState {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart: false,
        }
    }
}

impl PipelineState for InputAssemblyState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.topology = self.topology;
        info.primitive_restart = self.primitive_restart;
    }
}

#[derive(Debug, Copy, Clone)]
pub struct RasterizationState {
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            line_width: 1.0,
        }
    }
}

impl PipelineState for RasterizationState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.polygon_mode = self.polygon_mode;
        info.cull_mode = self.cull_mode;
        info.front_face = self.front_face;
        info.line_width = self.line_width;
    }
}

/// Depth testing. Stencil state is left disabled.
#[derive(Debug, Copy, Clone)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: vk::CompareOp,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_compare_op: vk::CompareOp::GREATER,
        }
    }
}

impl PipelineState for DepthStencilState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.depth_test = self.depth_test;
        info.depth_write = self.depth_write;
        info.depth_compare_op = self.depth_compare_op;
    }
}

/// Per-attachment color blending.
#[derive(Debug, Clone)]
pub struct ColorBlendState {
    pub attachments: Vec<vk::PipelineColorBlendAttachmentState>,
}

impl ColorBlendState {
    /// Blend state writing all channels of a single attachment without blending.
    pub fn opaque_attachment() -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::FALSE,
            color_write_mask: vk::ColorComponentFlags::RGBA,
            ..Default::default()
        }
    }
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            attachments: vec![Self::opaque_attachment()],
        }
    }
}

impl PipelineState for ColorBlendState {
    fn apply(&self, info: &mut PipelineStateInfo) {
        info.blend_attachments = self.attachments.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_fragments_win() {
        let states: Vec<Box<dyn PipelineState>> = vec![
            Box::new(MultisampleState::new(vk::SampleCountFlags::TYPE_4)),
            Box::new(RasterizationState {
                cull_mode: vk::CullModeFlags::NONE,
                ..Default::default()
            }),
            Box::new(MultisampleState::new(vk::SampleCountFlags::TYPE_8)),
        ];
        let mut info = PipelineStateInfo::default();
        for state in &states {
            state.apply(&mut info);
        }
        assert_eq!(info.rasterization_samples, vk::SampleCountFlags::TYPE_8);
        assert_eq!(info.cull_mode, vk::CullModeFlags::NONE);
    }

    #[test]
    fn viewport_from_extent_covers_extent() {
        let state = ViewportState::from_extent(vk::Extent2D {
            width: 800,
            height: 600,
        });
        assert_eq!(state.viewports.len(), 1);
        assert_eq!(state.viewports[0].width, 800.0);
        assert_eq!(state.viewports[0].height, 600.0);
        assert_eq!(state.viewports[0].max_depth, 1.0);
        assert_eq!(state.scissors[0].extent.width, 800);
    }
}
