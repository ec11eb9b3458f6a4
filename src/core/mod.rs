//! The core module holds the device-facing types shared by every other module.

pub mod command_pool;
pub mod device;
pub mod error;
pub mod queue;
pub mod settings;
pub mod window;
