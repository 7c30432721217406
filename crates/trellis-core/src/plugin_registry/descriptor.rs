use std::fmt;

use crate::plugin_registry::version::PluginVersion;

/// Handle to a plugin descriptor inside a [`PluginRegistry`] arena.
///
/// Handles are positional and are invalidated by
/// [`PluginRegistry::trim_disabled`]; handles stored inside kept descriptors
/// (extension cross-links) are remapped by that call.
///
/// [`PluginRegistry`]: crate::plugin_registry::registry::PluginRegistry
/// [`PluginRegistry::trim_disabled`]: crate::plugin_registry::registry::PluginRegistry::trim_disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub(crate) usize);

/// Handle to a fragment inside a [`PluginRegistry`] arena.
///
/// [`PluginRegistry`]: crate::plugin_registry::registry::PluginRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub(crate) usize);

/// How a prerequisite's required version is matched against candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Same major and minor as the required version, service level at least
    /// as high.
    Exact,
    /// Same major as the required version, overall at least as high.
    Compatible,
    /// Any version; the highest available wins.
    Latest,
}

/// A declared requirement from one plugin on another plugin id.
#[derive(Debug, Clone)]
pub struct Prerequisite {
    /// Id of the required plugin.
    pub plugin: String,
    /// Required version, if any. Absent means any version is acceptable.
    pub version: Option<String>,
    /// True requests an exact match, false a compatible one. Ignored when no
    /// version is given.
    pub exact_match: bool,
    /// Version of the descriptor chosen for this prerequisite, written back
    /// by the resolver.
    pub resolved_version: Option<String>,
}

impl Prerequisite {
    /// Requirement on any version of the given plugin.
    pub fn any(plugin: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            version: None,
            exact_match: false,
            resolved_version: None,
        }
    }

    /// Requirement on a version compatible with the given one.
    pub fn compatible(plugin: &str, version: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            version: Some(version.to_string()),
            exact_match: false,
            resolved_version: None,
        }
    }

    /// Requirement on exactly the given version.
    pub fn exact(plugin: &str, version: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            version: Some(version.to_string()),
            exact_match: true,
            resolved_version: None,
        }
    }

    /// The match rule this prerequisite implies.
    pub fn match_rule(&self) -> MatchRule {
        match (&self.version, self.exact_match) {
            (None, _) => MatchRule::Latest,
            (Some(_), true) => MatchRule::Exact,
            (Some(_), false) => MatchRule::Compatible,
        }
    }

    /// The required version parsed as an identifier, if one was declared.
    pub fn required_version(&self) -> Option<PluginVersion> {
        self.version.as_deref().map(PluginVersion::parse_lenient)
    }
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => {
                let rule = if self.exact_match { "exact" } else { "compatible" };
                write!(f, "requires plugin: {} (version: {}, {})", self.plugin, version, rule)
            }
            None => write!(f, "requires plugin: {} (any version)", self.plugin),
        }
    }
}

/// Reference to one extension inside its contributing descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionRef {
    pub plugin: DescriptorId,
    pub extension: usize,
}

/// Reference to one extension point inside its declaring descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionPointRef {
    pub plugin: DescriptorId,
    pub point: usize,
}

/// A declared extension contributing into another plugin's extension point.
#[derive(Debug, Clone)]
pub struct Extension {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Target of the contribution as `"pluginId.extensionPointId"`.
    pub point: String,
    /// Handle to the extension point this extension was attached to, filled
    /// in by cross-linking.
    pub resolved_point: Option<ExtensionPointRef>,
}

impl Extension {
    pub fn new(point: &str) -> Self {
        Self {
            id: None,
            name: None,
            point: point.to_string(),
            resolved_point: None,
        }
    }
}

/// A declared extension point other plugins can contribute into.
#[derive(Debug, Clone)]
pub struct ExtensionPoint {
    pub id: String,
    pub name: String,
    pub schema: Option<String>,
    /// Extensions attached by cross-linking, in resolution order.
    pub extensions: Vec<ExtensionRef>,
}

impl ExtensionPoint {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            schema: None,
            extensions: Vec::new(),
        }
    }
}

/// A runtime library shipped by a plugin.
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub exports: Vec<String>,
}

impl Library {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            exports: Vec::new(),
        }
    }
}

/// Auxiliary contribution bound to one specific plugin version. Its contents
/// are folded into the host plugin before resolution.
#[derive(Debug, Clone)]
pub struct FragmentDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Id of the host plugin.
    pub plugin_id: String,
    /// Version of the host plugin this fragment binds to.
    pub plugin_version: String,
    pub requires: Vec<Prerequisite>,
    pub extensions: Vec<Extension>,
    pub extension_points: Vec<ExtensionPoint>,
    pub libraries: Vec<Library>,
}

impl FragmentDescriptor {
    pub fn new(id: &str, name: &str, version: &str, plugin_id: &str, plugin_version: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            plugin_id: plugin_id.to_string(),
            plugin_version: plugin_version.to_string(),
            requires: Vec::new(),
            extensions: Vec::new(),
            extension_points: Vec::new(),
            libraries: Vec::new(),
        }
    }

    /// The fragment's own version as an identifier.
    pub fn version_id(&self) -> PluginVersion {
        PluginVersion::parse_lenient(&self.version)
    }

    /// The targeted host plugin version as an identifier.
    pub fn plugin_version_id(&self) -> PluginVersion {
        PluginVersion::parse_lenient(&self.plugin_version)
    }
}

/// A single `(id, version)` plugin record.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Unique identifier for the plugin.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Provider of the plugin.
    pub provider_name: Option<String>,
    /// Declared version string; parsed on demand with a sentinel fallback.
    pub version: String,
    /// Prerequisites on other plugins.
    pub requires: Vec<Prerequisite>,
    /// Contributions into other plugins' extension points.
    pub extensions: Vec<Extension>,
    /// Extension points this plugin declares.
    pub extension_points: Vec<ExtensionPoint>,
    /// Runtime libraries.
    pub libraries: Vec<Library>,
    /// Fragments attached to this plugin version.
    pub fragments: Vec<FragmentId>,
    /// Whether this descriptor takes part in the resolved registry.
    pub enabled: bool,
}

impl PluginDescriptor {
    pub fn new(id: &str, name: &str, version: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider_name: None,
            version: version.to_string(),
            requires: Vec::new(),
            extensions: Vec::new(),
            extension_points: Vec::new(),
            libraries: Vec::new(),
            fragments: Vec::new(),
            enabled: true,
        }
    }

    /// The declared version parsed as an identifier, with sentinel fallback.
    pub fn version_id(&self) -> PluginVersion {
        PluginVersion::parse_lenient(&self.version)
    }

    /// A plugin may coexist with another enabled version of the same id only
    /// when it contributes no extensions and no extension points.
    pub fn allows_concurrency(&self) -> bool {
        self.extensions.is_empty() && self.extension_points.is_empty()
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Builder for assembling plugin descriptors programmatically.
pub struct DescriptorBuilder {
    descriptor: PluginDescriptor,
}

impl DescriptorBuilder {
    /// Create a new builder for the given identity.
    pub fn new(id: &str, name: &str, version: &str) -> Self {
        Self {
            descriptor: PluginDescriptor::new(id, name, version),
        }
    }

    /// Set the provider name.
    pub fn provider(mut self, provider: &str) -> Self {
        self.descriptor.provider_name = Some(provider.to_string());
        self
    }

    /// Add a prerequisite.
    pub fn requires(mut self, prerequisite: Prerequisite) -> Self {
        self.descriptor.requires.push(prerequisite);
        self
    }

    /// Add an extension.
    pub fn extension(mut self, extension: Extension) -> Self {
        self.descriptor.extensions.push(extension);
        self
    }

    /// Add an extension point.
    pub fn extension_point(mut self, point: ExtensionPoint) -> Self {
        self.descriptor.extension_points.push(point);
        self
    }

    /// Add a library.
    pub fn library(mut self, library: Library) -> Self {
        self.descriptor.libraries.push(library);
        self
    }

    /// Set the initial enabled state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.descriptor.enabled = enabled;
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}
