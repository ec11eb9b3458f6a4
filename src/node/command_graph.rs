use std::sync::Arc;

use anyhow::Result;

use crate::core::window::Window;
use crate::node::{accept_all, Node, Visitor};
use crate::state::resource_hints::ResourceHints;

/// Root of the commands recorded into one command buffer. When bound to a window, everything below it is compiled
/// against the window's render pass, extent and sample count.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct CommandGraph {
    #[derivative(Debug = "ignore")]
    window: Option<Arc<dyn Window>>,
    children: Vec<Arc<dyn Node>>,
    hints: Option<ResourceHints>,
}

impl CommandGraph {
    /// Create a command graph not bound to any window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command graph recording for a window.
    pub fn for_window(window: Arc<dyn Window>) -> Self {
        Self {
            window: Some(window),
            ..Default::default()
        }
    }

    pub fn child(mut self, node: Arc<dyn Node>) -> Self {
        self.children.push(node);
        self
    }

    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn window(&self) -> Option<&Arc<dyn Window>> {
        self.window.as_ref()
    }

    pub fn children(&self) -> &[Arc<dyn Node>] {
        &self.children
    }
}

impl Node for CommandGraph {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_command_graph(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        accept_all(&self.children, visitor)
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}
