//! Scene graph nodes and the visitor interface traversals implement.
//!
//! Nodes are shared through `Arc<dyn Node>`, and the same node may be reachable through more than one parent.
//! Traversals use double dispatch: [`Node::accept()`] calls the [`Visitor`] method for the node's concrete kind,
//! and the visitor decides whether to descend by calling [`Node::traverse()`].
//!
//! Every `visit_*` method for a node kind defaults to [`Visitor::visit_node()`], so a visitor only has to handle the
//! node kinds it cares about.

use std::fmt::Debug;

use anyhow::Result;

use crate::command::{Command, Commands};
use crate::state::descriptor::{Descriptor, DescriptorSet};
use crate::state::resource_hints::ResourceHints;
use crate::state::StateCommand;

use command_graph::CommandGraph;
use geometry::Geometry;
use group::Group;
use lod::{Lod, PagedLod};
use render_graph::RenderGraph;
use state_group::StateGroup;

pub mod command_graph;
pub mod geometry;
pub mod group;
pub mod lod;
pub mod render_graph;
pub mod state_group;

/// A node in the scene graph.
pub trait Node: Debug + Send + Sync {
    /// Dispatch to the visitor method for this node's kind.
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()>;

    /// Visit the direct children of this node. Leaves have none.
    fn traverse(&self, _visitor: &mut dyn Visitor) -> Result<()> {
        Ok(())
    }

    /// Declared resource usage of this node's subgraph.
    fn resource_hints(&self) -> Option<&ResourceHints> {
        None
    }
}

/// Double dispatch target for scene graph traversals.
pub trait Visitor {
    /// Called for nodes without a more specific method. Implementations that want to descend call
    /// `node.traverse(self)`.
    fn visit_node(&mut self, node: &dyn Node) -> Result<()>;

    fn visit_group(&mut self, group: &Group) -> Result<()> {
        self.visit_node(group)
    }

    fn visit_state_group(&mut self, group: &StateGroup) -> Result<()> {
        self.visit_node(group)
    }

    fn visit_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        self.visit_node(geometry)
    }

    fn visit_lod(&mut self, lod: &Lod) -> Result<()> {
        self.visit_node(lod)
    }

    fn visit_paged_lod(&mut self, lod: &PagedLod) -> Result<()> {
        self.visit_node(lod)
    }

    fn visit_commands(&mut self, commands: &Commands) -> Result<()> {
        self.visit_node(commands)
    }

    fn visit_command_graph(&mut self, graph: &CommandGraph) -> Result<()> {
        self.visit_node(graph)
    }

    fn visit_render_graph(&mut self, graph: &RenderGraph) -> Result<()> {
        self.visit_node(graph)
    }

    /// Called for command leaves. Does nothing by default.
    fn visit_command(&mut self, _command: &dyn Command) -> Result<()> {
        Ok(())
    }

    /// Called for the state commands of a state group, by visitors that choose to visit them.
    fn visit_state_command(&mut self, _command: &dyn StateCommand) -> Result<()> {
        Ok(())
    }

    fn visit_descriptor_set(&mut self, _set: &DescriptorSet) -> Result<()> {
        Ok(())
    }

    fn visit_descriptor(&mut self, _descriptor: &Descriptor) -> Result<()> {
        Ok(())
    }
}

/// Accept the visitor on every node in a list, stopping at the first error.
pub(crate) fn accept_all(nodes: &[std::sync::Arc<dyn Node>], visitor: &mut dyn Visitor) -> Result<()> {
    for node in nodes {
        node.accept(visitor)?;
    }
    Ok(())
}
