use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::plugin_registry::descriptor::{DescriptorId, MatchRule};
use crate::plugin_registry::registry::PluginRegistry;
use crate::plugin_registry::version::PluginVersion;

/// Handle to one prerequisite inside its owning descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PrereqRef {
    pub owner: DescriptorId,
    pub index: usize,
}

/// One `parent → prerequisite` edge observed during traversal.
#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    /// Descriptor whose prerequisite created this constraint.
    pub parent: DescriptorId,
    /// The originating prerequisite.
    pub prereq: PrereqRef,
    /// Id of the required plugin.
    pub target: String,
    /// Required version, when one was declared.
    pub version: Option<PluginVersion>,
    pub rule: MatchRule,
}

impl Constraint {
    /// Build the constraint implied by the given prerequisite.
    pub fn from_prereq(registry: &PluginRegistry, prereq: PrereqRef) -> Self {
        let declared = &registry.descriptor(prereq.owner).requires[prereq.index];
        Self {
            parent: prereq.owner,
            prereq,
            target: declared.plugin.clone(),
            version: declared.required_version(),
            rule: declared.match_rule(),
        }
    }
}

/// Rollback log for one DFS subtree.
///
/// Two constraints sharing the same prerequisite cannot live in one cookie;
/// the second arrival signals a prerequisite loop.
#[derive(Debug)]
pub(crate) struct Cookie {
    pub ok: bool,
    pub changes: Vec<Constraint>,
}

impl Cookie {
    pub fn new() -> Self {
        Self {
            ok: true,
            changes: Vec::new(),
        }
    }

    /// Record a constraint; refuses a second constraint for the same
    /// prerequisite.
    pub fn add_change(&mut self, constraint: Constraint) -> bool {
        if self.changes.iter().any(|c| c.prereq == constraint.prereq) {
            return false;
        }
        self.changes.push(constraint);
        true
    }
}

/// A concurrency group: prerequisites on one plugin id that are jointly
/// satisfiable by a single descriptor.
#[derive(Debug, Default)]
pub(crate) struct ConstraintsEntry {
    constraints: Vec<Constraint>,
    best_match: Option<DescriptorId>,
    best_match_enabled: bool,
    resolved: bool,
}

/// Per-plugin-id resolution state: every known version in descending order
/// plus the concurrency groups accepted so far. The first group is the base
/// group and is never removed.
#[derive(Debug)]
pub(crate) struct IndexEntry {
    id: String,
    ver_list: Vec<DescriptorId>,
    groups: Vec<ConstraintsEntry>,
}

impl IndexEntry {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ver_list: Vec::new(),
            groups: vec![ConstraintsEntry::default()],
        }
    }

    pub fn versions(&self) -> &[DescriptorId] {
        &self.ver_list
    }

    #[cfg(test)]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Insert keeping descending version order. An exactly equal version is
    /// refused; the first registration wins.
    fn add_version(&mut self, registry: &PluginRegistry, descriptor: DescriptorId) -> bool {
        let version = registry.descriptor(descriptor).version_id();
        let mut at = self.ver_list.len();
        for (i, &other) in self.ver_list.iter().enumerate() {
            let existing = registry.descriptor(other).version_id();
            if existing == version {
                return false;
            }
            if version > existing {
                at = i;
                break;
            }
        }
        self.ver_list.insert(at, descriptor);
        true
    }

    /// Enabled descriptors satisfying every constraint in the group, best
    /// (highest version) first.
    pub fn matching_descriptors(
        &self,
        registry: &PluginRegistry,
        group: usize,
    ) -> Vec<DescriptorId> {
        let mut candidates: Vec<DescriptorId> = self
            .ver_list
            .iter()
            .copied()
            .filter(|&d| registry.descriptor(d).enabled)
            .collect();
        for constraint in &self.groups[group].constraints {
            let Some(required) = &constraint.version else {
                // a latest-match constraint keeps the set unchanged
                continue;
            };
            match constraint.rule {
                MatchRule::Latest => {}
                MatchRule::Exact => candidates
                    .retain(|&d| registry.descriptor(d).version_id().is_equivalent_to(required)),
                MatchRule::Compatible => candidates
                    .retain(|&d| registry.descriptor(d).version_id().is_compatible_with(required)),
            }
        }
        candidates
    }

    /// Try to place a constraint in an existing group, or open a new
    /// concurrency group for it.
    ///
    /// A group with other members accepts the constraint only when the
    /// winning descriptor allows concurrency; a new group may open only when
    /// the base group's current best match and the new group's own satisfier
    /// both allow it. Returns the accepting group and its best satisfier, or
    /// `None` when the constraint cannot be accommodated.
    pub fn add_constraint(
        &mut self,
        registry: &PluginRegistry,
        constraint: Constraint,
    ) -> Option<(usize, DescriptorId)> {
        let group_count = self.groups.len();
        for group in 0..group_count {
            self.groups[group].constraints.push(constraint.clone());
            if let Some(&best) = self.matching_descriptors(registry, group).first() {
                if group_count == 1 || registry.descriptor(best).allows_concurrency() {
                    debug!(
                        "registry resolve: push constraint on {} into group {}",
                        self.id, group
                    );
                    return Some((group, best));
                }
            }
            self.groups[group].constraints.pop();
        }

        // No existing group accepts it; concurrent coexistence is reserved
        // for plugins with no extension surface on either side.
        let base_best = self.matching_descriptors(registry, 0).first().copied()?;
        if !registry.descriptor(base_best).allows_concurrency() {
            debug!(
                "registry resolve: conflict on {}, {} does not allow concurrency",
                self.id,
                registry.descriptor(base_best)
            );
            return None;
        }
        let mut group = ConstraintsEntry::default();
        group.constraints.push(constraint);
        self.groups.push(group);
        let opened = self.groups.len() - 1;
        if let Some(&best) = self.matching_descriptors(registry, opened).first() {
            if registry.descriptor(best).allows_concurrency() {
                debug!(
                    "registry resolve: opened concurrency group {} for {}",
                    opened, self.id
                );
                return Some((opened, best));
            }
        }
        self.groups.pop();
        None
    }

    /// Remove every constraint created from the given prerequisite. A
    /// non-base group does not outlive its constraints; the base group
    /// persists even when empty.
    pub fn remove_constraints_for(&mut self, prereq: PrereqRef) {
        for group in &mut self.groups {
            group.constraints.retain(|c| c.prereq != prereq);
        }
        let mut group = self.groups.len();
        while group > 1 {
            group -= 1;
            if self.groups[group].constraints.is_empty() {
                debug!("registry resolve: pop empty group {} of {}", group, self.id);
                self.groups.remove(group);
            }
        }
    }

    pub fn is_resolved(&self, group: usize) -> bool {
        self.groups.get(group).map(|g| g.resolved).unwrap_or(false)
    }

    pub fn mark_resolved(&mut self, group: usize) {
        if let Some(g) = self.groups.get_mut(group) {
            g.resolved = true;
        }
    }

    /// Decide the final enabled descriptor for every group, then rewrite the
    /// enabled flags of all versions of this id accordingly and annotate the
    /// originating prerequisites with the chosen version.
    ///
    /// An empty group elects the latest version, preserving its enabled
    /// state, but only for root ids; a group whose constraints can no longer
    /// be satisfied elects nothing.
    pub fn resolve_dependencies(&mut self, registry: &mut PluginRegistry, roots: &[String]) {
        let is_root = roots.iter().any(|r| *r == self.id);
        for group in 0..self.groups.len() {
            let (best, enabled) = if self.groups[group].constraints.is_empty() {
                if is_root {
                    let best = self.ver_list.first().copied();
                    let enabled = best.map(|d| registry.descriptor(d).enabled).unwrap_or(false);
                    (best, enabled)
                } else {
                    (None, false)
                }
            } else {
                (
                    self.matching_descriptors(registry, group).first().copied(),
                    true,
                )
            };
            self.groups[group].best_match = best;
            self.groups[group].best_match_enabled = enabled;
        }

        for &descriptor in &self.ver_list {
            registry.descriptor_mut(descriptor).enabled = false;
        }

        for group in &self.groups {
            let Some(best) = group.best_match else { continue };
            registry.descriptor_mut(best).enabled = group.best_match_enabled;
            let version = registry.descriptor(best).version.clone();
            for constraint in &group.constraints {
                let owner = registry.descriptor_mut(constraint.prereq.owner);
                if let Some(prereq) = owner.requires.get_mut(constraint.prereq.index) {
                    prereq.resolved_version = Some(version.clone());
                }
            }
        }
    }
}

/// All per-id resolution state for one `resolve` pass. Entries are kept in a
/// BTreeMap so every walk over them is deterministic.
#[derive(Debug, Default)]
pub(crate) struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// Index every enabled descriptor by id. A duplicate of an already
    /// indexed version is disabled, first registration wins.
    pub fn build(registry: &mut PluginRegistry) -> Self {
        let mut index = Index::default();
        let all: Vec<_> = registry.ids().collect();
        for did in all {
            let descriptor = registry.descriptor(did);
            if !descriptor.enabled {
                continue;
            }
            let id = descriptor.id.clone();
            let entry = index
                .entries
                .entry(id.clone())
                .or_insert_with(|| IndexEntry::new(&id));
            if !entry.add_version(registry, did) {
                debug!(
                    "registry resolve: duplicate {} disabled",
                    registry.descriptor(did)
                );
                registry.descriptor_mut(did).enabled = false;
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut IndexEntry> {
        self.entries.get_mut(id)
    }

    /// Root ids: ids not named as a prerequisite by any id's highest
    /// version. When stripping leaves nothing (a pure prerequisite cycle),
    /// every indexed id is seeded as a root instead. All but the highest
    /// version of each root id are disabled; the returned list is sorted.
    pub fn compute_roots(&self, registry: &mut PluginRegistry) -> Vec<String> {
        let mut roots: BTreeSet<String> = self.entries.keys().cloned().collect();
        for entry in self.entries.values() {
            let Some(&top) = entry.ver_list.first() else {
                continue;
            };
            for prereq in &registry.descriptor(top).requires {
                roots.remove(&prereq.plugin);
            }
        }
        if roots.is_empty() {
            roots = self.entries.keys().cloned().collect();
        }
        for id in &roots {
            if let Some(entry) = self.entries.get(id) {
                for &lower in entry.ver_list.iter().skip(1) {
                    registry.descriptor_mut(lower).enabled = false;
                }
            }
            debug!("registry resolve: root {}", id);
        }
        roots.into_iter().collect()
    }

    /// Run the final disable/re-enable sweep over every entry.
    pub fn resolve_dependencies(&mut self, registry: &mut PluginRegistry, roots: &[String]) {
        for entry in self.entries.values_mut() {
            entry.resolve_dependencies(registry, roots);
        }
    }
}
