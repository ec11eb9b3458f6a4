//! Abstraction over the window a scene is compiled for.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::device::DeviceInterface;

/// The parts of a window (or any other presentation target) compilation needs. Swapchain management stays with the
/// implementor; deimos only queries the device and render pass, and the framebuffer layout to derive pipeline state from.
pub trait Window: Send + Sync {
    /// Get the device this window renders with, creating it on first use.
    fn device(&self) -> Result<Arc<dyn DeviceInterface>>;
    /// Get the render pass used for rendering into this window, creating it on first use.
    fn render_pass(&self) -> Result<vk::RenderPass>;
    /// Current extent of the window framebuffer.
    fn extent(&self) -> vk::Extent2D;
    /// Sample count of the window framebuffer.
    fn framebuffer_samples(&self) -> vk::SampleCountFlags;
}
