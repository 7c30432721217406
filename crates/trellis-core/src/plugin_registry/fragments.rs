use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::plugin_registry::descriptor::FragmentId;
use crate::plugin_registry::diagnostics::{Diagnostic, DiagnosticKind, ResolutionStatus};
use crate::plugin_registry::registry::PluginRegistry;
use crate::plugin_registry::validation::required_fragment;

/// Attach every valid fragment to the plugin version it names.
///
/// Invalid fragments are dropped with a diagnostic; fragments naming an
/// absent plugin version produce a missing-target diagnostic. A first-seen
/// set keyed on `(fragment id, fragment version)` masks exact duplicates.
pub(crate) fn link_fragments(registry: &mut PluginRegistry, status: &mut ResolutionStatus) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let all: Vec<FragmentId> = registry.fragment_ids().collect();
    for fid in all {
        let fragment = registry.fragment(fid);
        if !required_fragment(fragment) {
            let diagnostic = if fragment.id.is_empty() || fragment.name.is_empty() {
                Diagnostic::warning(
                    DiagnosticKind::FragmentMissingIdName,
                    "fragment ignored: missing id or name".to_string(),
                )
            } else {
                Diagnostic::warning(
                    DiagnosticKind::FragmentMissingAttribute,
                    format!(
                        "fragment '{}' version '{}' ignored: missing a required attribute",
                        fragment.id, fragment.version
                    ),
                )
            };
            status.add(diagnostic);
            continue;
        }
        if !seen.insert((fragment.id.clone(), fragment.version.clone())) {
            continue;
        }
        let target = registry.lookup(&fragment.plugin_id, &fragment.plugin_version_id());
        match target {
            Some(host) => {
                debug!(
                    "fragment {}@{} attached to plugin {}@{}",
                    fragment.id, fragment.version, fragment.plugin_id, fragment.plugin_version
                );
                registry.descriptor_mut(host).fragments.push(fid);
            }
            None => {
                status.add(Diagnostic::warning(
                    DiagnosticKind::FragmentTargetMissing,
                    format!(
                        "fragment '{}' targets missing plugin '{}' version '{}'",
                        fragment.id, fragment.plugin_id, fragment.plugin_version
                    ),
                ));
            }
        }
    }
}

/// Fold fragment contents into their host plugins.
///
/// For every plugin owning fragments, the attached fragments are grouped by
/// fragment id; within each group only the fragment whose plugin version
/// agrees with the host on major and minor components and whose own version
/// is greatest contributes. Its extensions, extension points, libraries and
/// prerequisites are spliced onto the host; other versions of the same
/// fragment id are discarded without diagnostic.
pub(crate) fn merge_fragments(registry: &mut PluginRegistry) {
    let all: Vec<_> = registry.ids().collect();
    for host in all {
        if registry.descriptor(host).fragments.is_empty() {
            continue;
        }
        let host_version = registry.descriptor(host).version_id();
        let attached = registry.descriptor(host).fragments.clone();

        let mut winners: BTreeMap<String, FragmentId> = BTreeMap::new();
        for fid in attached {
            let fragment = registry.fragment(fid);
            let bound = fragment.plugin_version_id();
            if bound.major != host_version.major || bound.minor != host_version.minor {
                continue;
            }
            match winners.get(&fragment.id) {
                Some(&current) if registry.fragment(current).version_id() >= fragment.version_id() => {}
                _ => {
                    winners.insert(fragment.id.clone(), fid);
                }
            }
        }

        for (_, fid) in winners {
            let fragment = registry.fragment(fid).clone();
            let descriptor = registry.descriptor_mut(host);
            descriptor.requires.extend(fragment.requires);
            descriptor.extensions.extend(fragment.extensions);
            descriptor.extension_points.extend(fragment.extension_points);
            descriptor.libraries.extend(fragment.libraries);
        }
    }
}
