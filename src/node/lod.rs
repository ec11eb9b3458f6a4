//! Level of detail nodes. Selection between levels happens at record time; compile and accounting traversals visit
//! every level that is present so all of them are ready to be drawn.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::core::error::Error;
use crate::node::{Node, Visitor};
use crate::state::resource_hints::ResourceHints;

/// One level of a [`Lod`] or [`PagedLod`].
#[derive(Debug, Clone)]
pub struct LodChild {
    /// Smallest ratio of projected bound height to screen height at which this level is drawn.
    pub minimum_screen_height_ratio: f32,
    pub node: Arc<dyn Node>,
}

/// Level of detail node with all levels resident.
#[derive(Debug, Default)]
pub struct Lod {
    children: Vec<LodChild>,
    hints: Option<ResourceHints>,
}

impl Lod {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level. Levels should be added from most to least detailed.
    pub fn level(mut self, minimum_screen_height_ratio: f32, node: Arc<dyn Node>) -> Self {
        self.children.push(LodChild {
            minimum_screen_height_ratio,
            node,
        });
        self
    }

    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn children(&self) -> &[LodChild] {
        &self.children
    }
}

impl Node for Lod {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_lod(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        for child in &self.children {
            child.node.accept(visitor)?;
        }
        Ok(())
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}

/// Level of detail node whose levels are loaded on demand from `filename`. Only levels that are currently loaded are
/// traversed, so a paged subgraph should carry resource hints covering what it may load later.
#[derive(Debug)]
pub struct PagedLod {
    filename: String,
    children: Mutex<Vec<LodChild>>,
    hints: Option<ResourceHints>,
}

impl PagedLod {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            children: Mutex::new(vec![]),
            hints: None,
        }
    }

    pub fn with_hints(mut self, hints: ResourceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// File the levels of this node are paged in from.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Install a loaded level.
    pub fn load(&self, minimum_screen_height_ratio: f32, node: Arc<dyn Node>) -> Result<()> {
        let mut children = self.children.lock().map_err(|_| Error::PoisonError)?;
        children.push(LodChild {
            minimum_screen_height_ratio,
            node,
        });
        Ok(())
    }

    /// Release all loaded levels.
    pub fn unload(&self) -> Result<()> {
        self.children.lock().map_err(|_| Error::PoisonError)?.clear();
        Ok(())
    }

    /// Whether any level is currently loaded.
    pub fn is_loaded(&self) -> Result<bool> {
        Ok(!self.children.lock().map_err(|_| Error::PoisonError)?.is_empty())
    }
}

impl Node for PagedLod {
    fn accept(&self, visitor: &mut dyn Visitor) -> Result<()> {
        visitor.visit_paged_lod(self)
    }

    fn traverse(&self, visitor: &mut dyn Visitor) -> Result<()> {
        // Snapshot the loaded levels so the lock is not held while visiting them.
        let children = self.children.lock().map_err(|_| Error::PoisonError)?.clone();
        for child in &children {
            child.node.accept(visitor)?;
        }
        Ok(())
    }

    fn resource_hints(&self) -> Option<&ResourceHints> {
        self.hints.as_ref()
    }
}
