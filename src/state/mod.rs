//! State commands and the GPU state objects they bind.
//!
//! State commands are attached to a [`StateGroup`](crate::node::state_group::StateGroup) and apply to everything
//! below it. Each command occupies a slot, which orders state binding and lets descriptor accounting predict the
//! highest slot in use. The commands in this crate use:
//! - slot 0: [`BindGraphicsPipeline`](pipeline::BindGraphicsPipeline)
//! - slot 1: [`BindDescriptorSets`](descriptor::BindDescriptorSets)

use std::fmt::Debug;

use anyhow::Result;

use crate::node::Visitor;
use crate::traversal::compile::CompileContext;

pub mod descriptor;
pub mod descriptor_pool;
pub mod pipeline;
pub mod pipeline_state;
pub mod resource_hints;

/// A command that binds GPU state for the subgraph of the state group it is attached to.
pub trait StateCommand: Debug + Send + Sync {
    /// Binding slot of this command.
    fn slot(&self) -> u32;

    /// Create the GPU objects this command binds. Must be idempotent.
    fn compile(&self, ctx: &mut CompileContext) -> Result<()>;

    /// Visit the objects this command references, such as descriptor sets.
    fn traverse(&self, _visitor: &mut dyn Visitor) -> Result<()> {
        Ok(())
    }
}
