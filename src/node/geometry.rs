use std::sync::Arc;

use anyhow::Result;

use crate::command::Command;
use crate::node::{Node, Visitor};
use crate::state::resource_hints::ResourceHints;
use crate::traversal::compile::{Compile, CompileContext};

/// Drawable leaf: vertex and index data plus the commands that draw it.
#[derive(Debug, Default)]
pub struct Geometry {
    arrays: Vec<Arc<dyn Compile>>,
    commands: Vec<Arc<dyn Command>>,
    hints: Option<ResourceHints>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex or index array. Arrays are materialized when the geometry is compiled.
    pub fn array(mut self, array: Arc<dyn Compile>) -> Self {
        self.arrays.push(array);
        self
    }

    /// Add a draw command.
    pub fn command(mut self, command: Arc<dyn Command>) -> Self {
        self.commands.push(command);
        self
    }

    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn arrays(&self) -> &[Arc<dyn Compile>] {
        &self.arrays
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    /// Materialize every array of this geometry.
    pub fn compile(&self, ctx: &mut CompileContext) -> Result<()> {
        for array in &self.arrays {
            array.compile(ctx)?;
        }
        Ok(())
    }
}

impl Node for Geometry {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_geometry(self)
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
