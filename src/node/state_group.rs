use std::sync::Arc;

use anyhow::Result;

use crate::node::{accept_all, Node, Visitor};
use crate::state::resource_hints::ResourceHints;
use crate::state::StateCommand;
use crate::traversal::compile::CompileContext;

/// Group that binds state for everything below it.
///
/// # Example
/// ```
/// # use std::sync::Arc;
/// # use deimos::prelude::*;
/// fn textured(bind_pipeline: BindGraphicsPipeline, bind_sets: BindDescriptorSets, mesh: Arc<Geometry>) -> StateGroup {
///     StateGroup::new()
///         .state(Arc::new(bind_pipeline))
///         .state(Arc::new(bind_sets))
///         .child(mesh)
/// }
/// ```
#[derive(Debug, Default)]
pub struct StateGroup {
    state_commands: Vec<Arc<dyn StateCommand>>,
    children: Vec<Arc<dyn Node>>,
    hints: Option<ResourceHints>,
}

impl StateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state command. State commands are compiled in the order they are added.
    pub fn state(mut self, command: Arc<dyn StateCommand>) -> Self {
        self.state_commands.push(command);
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

    pub fn state_commands(&self) -> &[Arc<dyn StateCommand>] {
        &self.state_commands
    }

    pub fn children(&self) -> &[Arc<dyn Node>] {
        &self.children
    }

    /// Compile every state command of this group.
    pub fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        for command in &self.state_commands {
            command.compile(ctx)?;
        }
        Ok(())
    }
}

impl Node for StateGroup {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_state_group(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        accept_all(&self.children, visitor)
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}
