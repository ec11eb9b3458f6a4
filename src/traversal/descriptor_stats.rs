//! Descriptor accounting.
//!
//! [`CollectDescriptorStats`] walks a scene graph and predicts the size of a descriptor pool that can hold every
//! descriptor set the scene allocates. The prediction is an upper bound: sets reachable through more than one path
//! are counted once, but a descriptor shared between distinct sets is counted for each of them, since each set needs
//! its own copy in the pool.
//!
//! Nodes carrying [`ResourceHints`] are not descended into. Their hint is taken as the total for their subgraph.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use ash::vk;

use crate::command::Command;
use crate::core::settings::DescriptorStatsSettings;
use crate::node::state_group::StateGroup;
use crate::node::{Node, Visitor};
use crate::state::descriptor::{Descriptor, DescriptorSet};
use crate::state::resource_hints::ResourceHints;
use crate::state::StateCommand;

/// Read-only visitor accumulating descriptor pool requirements.
#[derive(Debug, Default)]
pub struct CollectDescriptorStats {
    settings: DescriptorStatsSettings,
    /// Addresses of the sets seen so far.
    descriptor_sets: HashSet<usize>,
    descriptors: HashSet<usize>,
    /// Keyed by raw descriptor type, so pool sizes come out ordered by type.
    descriptor_type_counts: BTreeMap<i32, u32>,
    external_descriptor_sets: u32,
    max_slot: u32,
}

impl CollectDescriptorStats {
    pub fn new(settings: DescriptorStatsSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Highest state command slot seen.
    pub fn max_slot(&self) -> u32 {
        self.max_slot
    }

    /// Number of descriptor sets to reserve: hinted sets plus every distinct set seen.
    pub fn num_descriptor_sets(&self) -> u32 {
        let distinct = u32::try_from(self.descriptor_sets.len()).unwrap_or(u32::MAX);
        self.external_descriptor_sets.saturating_add(distinct)
    }

    /// Number of distinct descriptor objects seen.
    pub fn num_distinct_descriptors(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of descriptors to reserve per type, sorted by type.
    pub fn descriptor_pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        self.descriptor_type_counts
            .iter()
            .map(|(&ty, &descriptor_count)| vk::DescriptorPoolSize {
                ty: vk::DescriptorType::from_raw(ty),
                descriptor_count,
            })
            .collect()
    }

    /// Clear all accumulated counts. Required before reusing this visitor on a different subgraph.
    pub fn reset(&mut self) {
        self.descriptor_sets.clear();
        self.descriptors.clear();
        self.descriptor_type_counts.clear();
        self.external_descriptor_sets = 0;
        self.max_slot = 0;
    }

    /// Counts saturate, so huge hints still give an upper bound.
    fn add_descriptors(&mut self, ty: vk::DescriptorType, count: u32) {
        let total = self.descriptor_type_counts.entry(ty.as_raw()).or_default();
        *total = total.saturating_add(count);
    }

    /// Fold in resource hints, if present. Returns whether the subgraph below them should be skipped.
    fn apply_hints(&mut self, hints: Option<&ResourceHints>) -> bool {
        let Some(hints) = hints else {
            return false;
        };

        if !hints.descriptor_pool_sizes.is_empty() || hints.num_descriptor_sets > self.settings.hint_set_baseline {
            self.external_descriptor_sets = self.external_descriptor_sets.saturating_add(hints.num_descriptor_sets);
            for size in &hints.descriptor_pool_sizes {
                self.add_descriptors(size.ty, size.descriptor_count);
            }
        } else {
            warn!(
                "Ignoring descriptor counts of resource hints with no pool sizes and {} descriptor sets (baseline is {})",
                hints.num_descriptor_sets, self.settings.hint_set_baseline
            );
        }
        self.max_slot = self.max_slot.max(hints.max_slot);
        true
    }
}

impl Visitor for CollectDescriptorStats {
    fn visit_node(&mut self, node: &dyn Node) -> Result<()> {
        if self.apply_hints(node.resource_hints()) {
            return Ok(());
        }
        node.traverse(self)
    }

    fn visit_state_group(&mut self, group: &StateGroup) -> Result<()> {
        if self.apply_hints(group.resource_hints()) {
            return Ok(());
        }
        for command in group.state_commands() {
            self.visit_state_command(command.as_ref())?;
        }
        group.traverse(self)
    }

    fn visit_command(&mut self, command: &dyn Command) -> Result<()> {
        if self.apply_hints(command.resource_hints()) {
            return Ok(());
        }
        command.traverse(self)
    }

    fn visit_state_command(&mut self, command: &dyn StateCommand) -> Result<()> {
        self.max_slot = self.max_slot.max(command.slot());
        command.traverse(self)
    }

    fn visit_descriptor_set(&mut self, set: &DescriptorSet) -> Result<()> {
        if !self.descriptor_sets.insert(set as *const DescriptorSet as usize) {
            return Ok(());
        }
        set.traverse(self)
    }

    fn visit_descriptor(&mut self, descriptor: &Descriptor) -> Result<()> {
        self.descriptors.insert(descriptor as *const Descriptor as usize);
        self.add_descriptors(descriptor.ty, descriptor.num_descriptors());
        Ok(())
    }
}
