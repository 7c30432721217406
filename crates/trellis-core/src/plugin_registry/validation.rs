use crate::plugin_registry::descriptor::{FragmentDescriptor, PluginDescriptor};
use crate::plugin_registry::diagnostics::{Diagnostic, DiagnosticKind, ResolutionStatus};
use crate::plugin_registry::registry::PluginRegistry;

/// True iff the descriptor and every element it contains carry the
/// attributes the resolver depends on: id, name and version on the plugin, a
/// target id on every prerequisite, an extension-point target on every
/// extension, id and name on every extension point, a name on every library,
/// and a complete identity on every attached fragment.
pub fn required_plugin_descriptor(registry: &PluginRegistry, descriptor: &PluginDescriptor) -> bool {
    if descriptor.id.is_empty() || descriptor.name.is_empty() || descriptor.version.is_empty() {
        return false;
    }
    if descriptor.requires.iter().any(|p| p.plugin.is_empty()) {
        return false;
    }
    if descriptor.extensions.iter().any(|e| e.point.is_empty()) {
        return false;
    }
    if descriptor
        .extension_points
        .iter()
        .any(|p| p.id.is_empty() || p.name.is_empty())
    {
        return false;
    }
    if descriptor.libraries.iter().any(|l| l.name.is_empty()) {
        return false;
    }
    descriptor
        .fragments
        .iter()
        .all(|&f| required_fragment(registry.fragment(f)))
}

/// True iff the fragment carries its full identity: id, name, version, and
/// the id and version of the plugin it binds to.
pub fn required_fragment(fragment: &FragmentDescriptor) -> bool {
    !(fragment.id.is_empty()
        || fragment.name.is_empty()
        || fragment.version.is_empty()
        || fragment.plugin_id.is_empty()
        || fragment.plugin_version.is_empty())
}

/// Disable every descriptor missing a required attribute, recording one
/// diagnostic per offender.
pub(crate) fn validate_descriptors(registry: &mut PluginRegistry, status: &mut ResolutionStatus) {
    let all: Vec<_> = registry.ids().collect();
    for did in all {
        let descriptor = registry.descriptor(did);
        if required_plugin_descriptor(registry, descriptor) {
            continue;
        }
        let diagnostic = if descriptor.id.is_empty() || descriptor.name.is_empty() {
            Diagnostic::warning(
                DiagnosticKind::PluginMissingIdName,
                format!("plugin '{}' disabled: missing id or name", descriptor),
            )
        } else {
            Diagnostic::warning(
                DiagnosticKind::PluginMissingAttribute,
                format!("plugin '{}' disabled: missing a required attribute", descriptor),
            )
        };
        status.add(diagnostic);
        registry.descriptor_mut(did).enabled = false;
    }
}
