//! Scene graph compilation and synchronization for Vulkan
//!
//! Deimos is the layer of a retained-mode scene graph renderer that sits between the scene and the device. It
//! walks a scene graph to create the GPU objects its nodes need, predicts how large the descriptor pool for a scene
//! must be, and turns high level barrier descriptions into native pipeline barriers at record time.
//!
//! To get started, import the prelude
//! ```
//! use deimos::prelude::*;
//! ```
//!
//! # Example
//!
//! A scene is a graph of [`Node`](crate::node::Node)s. Scoping nodes like a
//! [`RenderGraph`](crate::node::render_graph::RenderGraph) decide which render pass and pipeline state everything
//! below them is compiled for.
//! ```
//! # use std::sync::Arc;
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn compile(device: Arc<dyn DeviceInterface>, render_pass: vk::RenderPass, state: StateGroup) -> Result<()> {
//!     let area = vk::Rect2D {
//!         offset: vk::Offset2D::default(),
//!         extent: vk::Extent2D { width: 1920, height: 1080 },
//!     };
//!     let scene = RenderGraph::new(render_pass, area)
//!         .samples(vk::SampleCountFlags::TYPE_4)
//!         .child(Arc::new(state));
//!
//!     let context = CompileContext::new(device, BufferPreferences::default());
//!     let mut traversal = CompileTraversal::new(context);
//!     traversal.compile_scene(&scene)
//! }
//! ```
//! For further example code, check out the following modules
//! - [`traversal`] for compiling a scene and sizing its descriptor pool.
//! - [`node`] for the scene graph nodes and the visitor interface.
//! - [`state`] for pipelines, descriptor sets and the state commands binding them.
//! - [`sync`] for pipeline barriers.
//! - [`allocator`] for the scratch memory used while recording.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod allocator;
pub mod command;
pub mod core;
pub mod node;
pub mod state;
pub mod sync;
pub mod traversal;
pub mod util;
