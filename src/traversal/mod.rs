//! Scene graph traversals.
//!
//! - [`CompileTraversal`](compile::CompileTraversal) materializes GPU state for every node it reaches.
//! - [`CollectDescriptorStats`](descriptor_stats::CollectDescriptorStats) predicts the descriptor pool a scene needs,
//!   without touching the device.
//!
//! # Example
//! ```
//! # use std::sync::Arc;
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn compile_for_window(window: &dyn Window, scene: Arc<dyn Node>) -> Result<CompileTraversal> {
//!     let context = CompileContext::from_window(window, None, BufferPreferences::default())?;
//!     let mut traversal = CompileTraversal::new(context);
//!     // Sizes and reserves a descriptor pool first, then compiles.
//!     traversal.compile_scene(scene.as_ref())?;
//!     Ok(traversal)
//! }
//! ```

pub mod compile;
pub mod descriptor_stats;
