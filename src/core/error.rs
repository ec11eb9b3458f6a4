//! Exposes the deimos error type

use std::sync::PoisonError;

use ash;
use thiserror::Error;

/// Error type that deimos can return.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic Vulkan error type.
    #[error("Vulkan error: `{0}`")]
    VkError(ash::vk::Result),
    /// No queue was found for the requested capabilities.
    #[error("No queue family found supporting `{0:?}`.")]
    NoCapableQueue(ash::vk::QueueFlags),
    /// A descriptor set was compiled before a descriptor pool was reserved on the compile context.
    #[error("No descriptor pool available in the compile context. Reserve one before compiling descriptor sets.")]
    NoDescriptorPool,
    /// A graphics pipeline was compiled outside of any render pass.
    #[error("Tried to compile a graphics pipeline without an active render pass.")]
    NoRenderPass,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}

impl From<ash::vk::Result> for Error {
    fn from(value: ash::vk::Result) -> Self {
        Error::VkError(value)
    }
}

impl From<(Vec<ash::vk::Pipeline>, ash::vk::Result)> for Error {
    fn from((_, result): (Vec<ash::vk::Pipeline>, ash::vk::Result)) -> Self {
        Error::VkError(result)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
