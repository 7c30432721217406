use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::plugin_registry::descriptor::{DescriptorId, ExtensionPointRef, ExtensionRef};
use crate::plugin_registry::diagnostics::{Diagnostic, DiagnosticKind, ResolutionStatus};
use crate::plugin_registry::fragments;
use crate::plugin_registry::index::{Constraint, Cookie, Index, PrereqRef};
use crate::plugin_registry::registry::PluginRegistry;
use crate::plugin_registry::validation;

/// Option key enabling verbose resolution tracing, read by
/// [`RegistryResolver::configure`].
pub const DEBUG_RESOLVE_OPTION: &str = "registry/debug/resolve";

/// Batch resolver turning a raw plugin registry into a consistent,
/// cross-linked one.
///
/// One [`resolve`](RegistryResolver::resolve) call links and merges
/// fragments, validates descriptors, chooses a single enabled version per
/// plugin id satisfying every prerequisite simultaneously (with concurrent
/// coexistence for library-like plugins), back-annotates the chosen versions
/// onto the prerequisites, removes disabled descriptors and attaches
/// extensions to their extension points. Faults never abort the pass; each
/// is recorded in the returned status and the offending descriptor is
/// disabled.
///
/// The pass is single-threaded and performs no I/O; its recursion depth is
/// bounded by the longest acyclic prerequisite chain, so callers resolving
/// adversarially deep registries on stack-limited targets should run it on a
/// thread with an adequate stack.
pub struct RegistryResolver {
    trim_plugins: bool,
    cross_link: bool,
    debug: bool,
}

impl Default for RegistryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryResolver {
    /// Create a resolver with trimming and cross-linking enabled.
    pub fn new() -> Self {
        Self {
            trim_plugins: true,
            cross_link: true,
            debug: false,
        }
    }

    /// When disabled, descriptors that end up disabled stay in the registry.
    pub fn set_trim_plugins(&mut self, trim_plugins: bool) {
        self.trim_plugins = trim_plugins;
    }

    /// When disabled, extensions are not attached to their extension points.
    pub fn set_cross_link(&mut self, cross_link: bool) {
        self.cross_link = cross_link;
    }

    /// Toggle verbose resolution tracing on the `log` facade.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether verbose resolution tracing is enabled.
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Read the debug toggle from a string-keyed options map; the value
    /// `"true"` (case-insensitive) under [`DEBUG_RESOLVE_OPTION`] enables
    /// tracing, anything else disables it.
    pub fn configure(&mut self, options: &HashMap<String, String>) {
        if let Some(value) = options.get(DEBUG_RESOLVE_OPTION) {
            self.debug = value.eq_ignore_ascii_case("true");
        }
    }

    /// Resolve the registry in place and return the accumulated status.
    ///
    /// Idempotent: a registry already marked resolved is returned untouched
    /// with an OK status.
    pub fn resolve(&self, registry: &mut PluginRegistry) -> ResolutionStatus {
        let mut status = ResolutionStatus::new();
        if registry.is_resolved() {
            return status;
        }

        fragments::link_fragments(registry, &mut status);
        fragments::merge_fragments(registry);
        validation::validate_descriptors(registry, &mut status);

        let index = Index::build(registry);
        if index.is_empty() {
            registry.disable_all();
            status.add(Diagnostic::error(
                DiagnosticKind::UnableToResolve,
                "unable to resolve the plugin registry: no root plugins found".to_string(),
            ));
            registry.mark_resolved();
            return status;
        }

        {
            let mut context = ResolveContext {
                registry: &mut *registry,
                index,
                status: &mut status,
                debug: self.debug,
            };
            let mut roots = context.index.compute_roots(context.registry);
            let mut orphans: Vec<String> = Vec::new();
            for root in roots.clone() {
                let mut cookie = Cookie::new();
                context.resolve_node(&root, None, &mut cookie, &mut orphans);
            }
            // orphans freed by rollback retry as roots; resolving one orphan
            // may surface further orphans, hence the index-driven walk
            let mut next = 0;
            while next < orphans.len() {
                let orphan = orphans[next].clone();
                next += 1;
                if roots.contains(&orphan) {
                    continue;
                }
                context.trace(format_args!("orphan {} promoted to root", orphan));
                roots.push(orphan.clone());
                let mut cookie = Cookie::new();
                context.resolve_node(&orphan, None, &mut cookie, &mut orphans);
            }
            context.index.resolve_dependencies(context.registry, &roots);
        }

        if self.trim_plugins {
            registry.trim_disabled();
        }
        if self.cross_link {
            cross_link(registry, &mut status);
        }
        registry.mark_resolved();
        status
    }
}

/// State shared by the recursive descent of one `resolve` pass.
struct ResolveContext<'a> {
    registry: &'a mut PluginRegistry,
    index: Index,
    status: &'a mut ResolutionStatus,
    debug: bool,
}

impl ResolveContext<'_> {
    fn trace(&self, args: fmt::Arguments<'_>) {
        if self.debug {
            debug!("registry resolve: {}", args);
        }
    }

    /// Resolve one node of the prerequisite DAG.
    ///
    /// Called with `parent == None` for roots (no constraint is added) and
    /// with the originating prerequisite otherwise. On failure the cookie is
    /// marked not-ok; the caller that owns the failing subtree rolls back
    /// the constraints it contributed, orphaning their targets, and disables
    /// itself.
    fn resolve_node(
        &mut self,
        child: &str,
        parent: Option<PrereqRef>,
        cookie: &mut Cookie,
        orphans: &mut Vec<String>,
    ) {
        if self.index.entry(child).is_none() {
            if let Some(p) = parent {
                let parent_id = self.registry.descriptor(p.owner).id.clone();
                self.trace(format_args!("{} not found, required by {}", child, parent_id));
                self.status.add(Diagnostic::warning(
                    DiagnosticKind::PrerequisiteDisabled,
                    format!(
                        "plugin '{}' requires plugin '{}', which is missing or disabled",
                        parent_id, child
                    ),
                ));
            }
            cookie.ok = false;
            return;
        }

        let (group, child_pd) = match parent {
            Some(p) => {
                let constraint = Constraint::from_prereq(self.registry, p);
                let placed = match self.index.entry_mut(child) {
                    Some(entry) => entry.add_constraint(&*self.registry, constraint.clone()),
                    None => None,
                };
                match placed {
                    None => {
                        let parent_id = self.registry.descriptor(p.owner).id.clone();
                        self.trace(format_args!(
                            "no descriptor satisfies {} for {}",
                            child, parent_id
                        ));
                        self.status.add(Diagnostic::warning(
                            DiagnosticKind::UnsatisfiedPrerequisite,
                            format!(
                                "plugin '{}' has an unsatisfied prerequisite on plugin '{}'",
                                parent_id, child
                            ),
                        ));
                        // the target itself may still be viable once freed of
                        // this edge; let the orphan sweep reconsider it
                        if !orphans.iter().any(|o| o == child) {
                            orphans.push(child.to_string());
                        }
                        cookie.ok = false;
                        return;
                    }
                    Some((group, best)) => {
                        if !cookie.add_change(constraint) {
                            let parent_id = self.registry.descriptor(p.owner).id.clone();
                            self.trace(format_args!(
                                "prerequisite loop from {} back to {}",
                                parent_id, child
                            ));
                            self.status.add(Diagnostic::warning(
                                DiagnosticKind::PrerequisiteLoop,
                                format!(
                                    "prerequisite loop detected from plugin '{}' back to plugin '{}'",
                                    parent_id, child
                                ),
                            ));
                            cookie.ok = false;
                            return;
                        }
                        (group, best)
                    }
                }
            }
            None => {
                let best = match self.index.entry(child) {
                    Some(entry) => entry.matching_descriptors(&*self.registry, 0).first().copied(),
                    None => None,
                };
                match best {
                    None => {
                        cookie.ok = false;
                        return;
                    }
                    Some(best) => (0, best),
                }
            }
        };

        if self
            .index
            .entry(child)
            .is_some_and(|entry| entry.is_resolved(group))
        {
            return;
        }

        self.trace(format_args!(
            "visiting {}",
            self.registry.descriptor(child_pd)
        ));

        let prereq_count = self.registry.descriptor(child_pd).requires.len();
        for i in 0..prereq_count {
            if !cookie.ok {
                break;
            }
            let target = self.registry.descriptor(child_pd).requires[i].plugin.clone();
            self.resolve_node(
                &target,
                Some(PrereqRef {
                    owner: child_pd,
                    index: i,
                }),
                cookie,
                orphans,
            );
        }

        if cookie.ok {
            if let Some(entry) = self.index.entry_mut(child) {
                entry.mark_resolved(group);
            }
            return;
        }

        // roll back every constraint this descriptor contributed, orphaning
        // the freed targets, then retire the descriptor itself
        let mut i = 0;
        while i < cookie.changes.len() {
            if cookie.changes[i].parent != child_pd {
                i += 1;
                continue;
            }
            let change = cookie.changes.remove(i);
            self.trace(format_args!(
                "rollback pops constraint on {} from {}",
                change.target,
                self.registry.descriptor(child_pd)
            ));
            if let Some(entry) = self.index.entry_mut(&change.target) {
                entry.remove_constraints_for(change.prereq);
            }
            if !orphans.contains(&change.target) {
                orphans.push(change.target);
            }
        }
        self.trace(format_args!(
            "{} disabled during rollback",
            self.registry.descriptor(child_pd)
        ));
        self.registry.descriptor_mut(child_pd).enabled = false;
    }
}

/// Attach every enabled plugin's extensions to the extension points they
/// target. The target string is split at its last `'.'` into plugin id and
/// extension-point id; a missing plugin or point, or a target plugin with no
/// enabled version, produces a diagnostic and the extension is skipped.
fn cross_link(registry: &mut PluginRegistry, status: &mut ResolutionStatus) {
    let sources: Vec<(DescriptorId, usize)> = registry
        .descriptors()
        .filter(|(_, pd)| pd.enabled)
        .flat_map(|(did, pd)| (0..pd.extensions.len()).map(move |i| (did, i)))
        .collect();

    for (did, ext_index) in sources {
        let (source_id, point) = {
            let pd = registry.descriptor(did);
            (pd.id.clone(), pd.extensions[ext_index].point.clone())
        };
        let Some((target_plugin, point_id)) = point.rsplit_once('.') else {
            status.add(Diagnostic::warning(
                DiagnosticKind::ExtensionPointUnknown,
                format!(
                    "extension in plugin '{}' targets unknown extension point '{}'",
                    source_id, point
                ),
            ));
            continue;
        };

        let candidates = registry.plugins_with_id(target_plugin);
        if candidates.is_empty() {
            status.add(Diagnostic::warning(
                DiagnosticKind::ExtensionPointUnknown,
                format!(
                    "extension in plugin '{}' targets unknown extension point '{}'",
                    source_id, point
                ),
            ));
            continue;
        }
        let enabled: Vec<DescriptorId> = candidates
            .into_iter()
            .filter(|&d| registry.descriptor(d).enabled)
            .collect();
        if enabled.is_empty() {
            status.add(Diagnostic::warning(
                DiagnosticKind::ExtensionPointDisabled,
                format!(
                    "extension in plugin '{}' targets extension point '{}' in a disabled plugin",
                    source_id, point
                ),
            ));
            continue;
        }

        let mut linked = false;
        for host in enabled {
            let position = registry
                .descriptor(host)
                .extension_points
                .iter()
                .position(|p| p.id == point_id);
            if let Some(point_index) = position {
                registry.descriptor_mut(host).extension_points[point_index]
                    .extensions
                    .push(ExtensionRef {
                        plugin: did,
                        extension: ext_index,
                    });
                registry.descriptor_mut(did).extensions[ext_index].resolved_point =
                    Some(ExtensionPointRef {
                        plugin: host,
                        point: point_index,
                    });
                linked = true;
                break;
            }
        }
        if !linked {
            status.add(Diagnostic::warning(
                DiagnosticKind::ExtensionPointUnknown,
                format!(
                    "extension in plugin '{}' targets unknown extension point '{}'",
                    source_id, point
                ),
            ));
        }
    }
}
