//! Commands are the leaves of the scene graph: units of work that are compiled once and then recorded into a
//! [`CommandRecorder`](recorder::CommandRecorder) every time the graph is recorded.
//!
//! The only command shipped with this crate is the [`PipelineBarrier`](crate::sync::pipeline_barrier::PipelineBarrier).
//! Draw commands and other recorded work are implemented by users of the [`Command`] trait.

use std::sync::Arc;

use anyhow::Result;

use crate::node::{Node, Visitor};
use crate::state::resource_hints::ResourceHints;
use crate::traversal::compile::CompileContext;

use recorder::CommandRecorder;

pub mod recorder;

/// A recordable scene graph leaf.
pub trait Command: Node {
    /// Create the GPU state this command needs before it can be recorded. This may be called more than once for the
    /// same command and must be idempotent.
    fn compile(&self, _ctx: &mut CompileContext) -> Result<()> {
        Ok(())
    }

    /// Record this command.
    fn record(&self, recorder: &mut dyn CommandRecorder) -> Result<()>;
}

/// A list of commands that are compiled and recorded together, in order.
#[derive(Debug, Default)]
pub struct Commands {
    commands: Vec<Arc<dyn Command>>,
    hints: Option<ResourceHints>,
}

impl Commands {
    pub fn new(commands: Vec<Arc<dyn Command>>) -> Self {
        Self {
            commands,
            hints: None,
        }
    }

    /// Attach resource hints bounding the descriptor usage of this command list.
    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn push(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }
}

impl Node for Commands {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_commands(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        for command in &self.commands {
            command.accept(visitor)?;
        }
        Ok(())
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}

impl Command for Commands {
    fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        for command in &self.commands {
            command.compile(ctx)?;
        }
        Ok(())
    }

    fn record(&self, recorder: &mut dyn CommandRecorder) -> Result<()> {
        for command in &self.commands {
            command.record(recorder)?;
        }
        Ok(())
    }
}
