use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::core::window::Window;
use crate::node::{accept_all, Node, Visitor};
use crate::state::pipeline_state::ViewportState;
use crate::state::resource_hints::ResourceHints;

/// View the scene below a render graph is rendered from. Only the viewport matters for compilation.
#[derive(Debug, Clone, Default)]
pub struct Camera {
    pub viewport: Option<Arc<ViewportState>>,
}

impl Camera {
    pub fn new(viewport: Arc<ViewportState>) -> Self {
        Self {
            viewport: Some(viewport),
        }
    }
}

/// A render pass instance. Pipelines below it are compiled for its render pass, with its viewport and sample count.
///
/// The render pass and sample count are taken from the render graph itself when set, otherwise from its window.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct RenderGraph {
    #[derivative(Debug = "ignore")]
    window: Option<Arc<dyn Window>>,
    render_pass: Option<vk::RenderPass>,
    samples: Option<vk::SampleCountFlags>,
    render_area: vk::Rect2D,
    camera: Option<Camera>,
    children: Vec<Arc<dyn Node>>,
    hints: Option<ResourceHints>,
}

impl RenderGraph {
    /// Create a render graph for an explicit render pass.
    pub fn new(render_pass: vk::RenderPass, render_area: vk::Rect2D) -> Self {
        Self {
            render_pass: Some(render_pass),
            render_area,
            ..Default::default()
        }
    }

    /// Create a render graph rendering into a window. The render area covers the whole window.
    pub fn for_window(window: Arc<dyn Window>) -> Self {
        let render_area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: window.extent(),
        };
        Self {
            window: Some(window),
            render_area,
            ..Default::default()
        }
    }

    /// Set the number of samples per pixel of the render pass attachments.
    pub fn samples(mut self, samples: vk::SampleCountFlags) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn child(mut self, node: Arc<dyn Node>) -> Self {
        self.children.push(node);
        self
    }

    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Get the render pass, asking the window for it if none was set explicitly.
    /// # Errors
    /// Fails with [`Error::NoRenderPass`] if there is neither a render pass nor a window.
    pub fn render_pass(&self) -> Result<vk::RenderPass> {
        match (self.render_pass, &self.window) {
            (Some(render_pass), _) => Ok(render_pass),
            (None, Some(window)) => window.render_pass(),
            (None, None) => Err(Error::NoRenderPass.into()),
        }
    }

    /// Sample count of the render pass attachments.
    pub fn sample_count(&self) -> vk::SampleCountFlags {
        match (self.samples, &self.window) {
            (Some(samples), _) => samples,
            (None, Some(window)) => window.framebuffer_samples(),
            (None, None) => vk::SampleCountFlags::TYPE_1,
        }
    }

    pub fn render_area(&self) -> vk::Rect2D {
        self.render_area
    }

    pub fn camera_viewport(&self) -> Option<&Arc<ViewportState>> {
        self.camera.as_ref().and_then(|camera| camera.viewport.as_ref())
    }

    pub fn window(&self) -> Option<&Arc<dyn Window>> {
        self.window.as_ref()
    }

    pub fn children(&self) -> &[Arc<dyn Node>] {
        &self.children
    }
}

impl Node for RenderGraph {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_render_graph(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        accept_all(&self.children, visitor)
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}
