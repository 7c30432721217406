use crate::plugin_registry::descriptor::{
    DescriptorId, ExtensionPointRef, ExtensionRef, FragmentDescriptor, FragmentId,
    PluginDescriptor,
};
use crate::plugin_registry::version::PluginVersion;

/// Store of plugin descriptors and fragments, mutated in place by the
/// resolver.
///
/// Descriptors and fragments live in arenas addressed by [`DescriptorId`] and
/// [`FragmentId`] handles; cross-links between extensions and extension
/// points are stored as handles rather than owning references.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    descriptors: Vec<PluginDescriptor>,
    fragments: Vec<FragmentDescriptor>,
    resolved: bool,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin descriptor, returning its handle.
    pub fn add_plugin(&mut self, descriptor: PluginDescriptor) -> DescriptorId {
        self.descriptors.push(descriptor);
        DescriptorId(self.descriptors.len() - 1)
    }

    /// Add a fragment, returning its handle.
    pub fn add_fragment(&mut self, fragment: FragmentDescriptor) -> FragmentId {
        self.fragments.push(fragment);
        FragmentId(self.fragments.len() - 1)
    }

    /// Access a descriptor by handle.
    pub fn descriptor(&self, id: DescriptorId) -> &PluginDescriptor {
        &self.descriptors[id.0]
    }

    /// Mutable access to a descriptor by handle.
    pub fn descriptor_mut(&mut self, id: DescriptorId) -> &mut PluginDescriptor {
        &mut self.descriptors[id.0]
    }

    /// Access a fragment by handle.
    pub fn fragment(&self, id: FragmentId) -> &FragmentDescriptor {
        &self.fragments[id.0]
    }

    /// Iterate over all descriptors with their handles, in insertion order.
    pub fn descriptors(&self) -> impl Iterator<Item = (DescriptorId, &PluginDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, pd)| (DescriptorId(i), pd))
    }

    /// Handles of all descriptors, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = DescriptorId> + use<> {
        (0..self.descriptors.len()).map(DescriptorId)
    }

    /// Handles of all fragments, in insertion order.
    pub fn fragment_ids(&self) -> impl Iterator<Item = FragmentId> + use<> {
        (0..self.fragments.len()).map(FragmentId)
    }

    /// Number of plugin descriptors.
    pub fn plugin_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// All descriptors carrying the given plugin id, in insertion order.
    pub fn plugins_with_id(&self, id: &str) -> Vec<DescriptorId> {
        self.descriptors()
            .filter(|(_, pd)| pd.id == id)
            .map(|(did, _)| did)
            .collect()
    }

    /// Look up the descriptor with the given id and version identifier.
    pub fn lookup(&self, id: &str, version: &PluginVersion) -> Option<DescriptorId> {
        self.descriptors()
            .find(|(_, pd)| pd.id == id && pd.version_id() == *version)
            .map(|(did, _)| did)
    }

    /// Whether a `resolve` pass has already completed on this registry.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Mark the registry as resolved; later `resolve` calls become no-ops.
    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Clear the enabled flag on every descriptor.
    pub fn disable_all(&mut self) {
        for pd in &mut self.descriptors {
            pd.enabled = false;
        }
    }

    /// Remove every disabled descriptor, remapping the extension and
    /// extension-point handles held by the survivors. Existing
    /// [`DescriptorId`] values held by callers are invalidated.
    pub fn trim_disabled(&mut self) {
        let mut remap: Vec<Option<usize>> = vec![None; self.descriptors.len()];
        let mut kept: Vec<PluginDescriptor> = Vec::with_capacity(self.descriptors.len());
        for (old, pd) in self.descriptors.drain(..).enumerate() {
            if pd.enabled {
                remap[old] = Some(kept.len());
                kept.push(pd);
            }
        }
        for pd in &mut kept {
            for ext in &mut pd.extensions {
                ext.resolved_point = ext.resolved_point.and_then(|r| {
                    remap[r.plugin.0].map(|new| ExtensionPointRef {
                        plugin: DescriptorId(new),
                        point: r.point,
                    })
                });
            }
            for point in &mut pd.extension_points {
                point.extensions = point
                    .extensions
                    .iter()
                    .filter_map(|r| {
                        remap[r.plugin.0].map(|new| ExtensionRef {
                            plugin: DescriptorId(new),
                            extension: r.extension,
                        })
                    })
                    .collect();
            }
        }
        self.descriptors = kept;
    }
}
