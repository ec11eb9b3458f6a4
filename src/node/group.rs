use std::sync::Arc;

use anyhow::Result;

use crate::node::{accept_all, Node, Visitor};
use crate::state::resource_hints::ResourceHints;

/// Plain grouping node. Traversals pass straight through it.
#[derive(Debug, Default)]
pub struct Group {
    children: Vec<Arc<dyn Node>>,
    hints: Option<ResourceHints>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child node.
    pub fn child(mut self, node: Arc<dyn Node>) -> Self {
        self.children.push(node);
        self
    }

    /// Attach resource hints covering this group's subgraph.
    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn add_child(&mut self, node: Arc<dyn Node>) {
        self.children.push(node);
    }

    pub fn children(&self) -> &[Arc<dyn Node>] {
        &self.children
    }
}

impl Node for Group {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_group(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        accept_all(&self.children, visitor)
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}
