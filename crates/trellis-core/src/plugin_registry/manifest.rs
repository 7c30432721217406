use serde::Deserialize;

use crate::plugin_registry::descriptor::{
    Extension, ExtensionPoint, FragmentDescriptor, Library, PluginDescriptor, Prerequisite,
};

/// Declarative plugin manifest as found on disk (`plugin.json`,
/// `plugin.toml`).
///
/// Parsing is deliberately lenient: every field defaults when absent so that
/// incomplete manifests still reach the resolver, whose validator reports
/// the missing attributes as diagnostics instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginManifest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub requires: Vec<PrerequisiteEntry>,
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
    #[serde(default, alias = "extension-points")]
    pub extension_points: Vec<ExtensionPointEntry>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

/// Declarative fragment manifest (`fragment.json`, `fragment.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentManifest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub plugin: String,
    #[serde(default, alias = "plugin-version")]
    pub plugin_version: String,
    #[serde(default)]
    pub requires: Vec<PrerequisiteEntry>,
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
    #[serde(default, alias = "extension-points")]
    pub extension_points: Vec<ExtensionPointEntry>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

/// One `requires` entry of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrerequisiteEntry {
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub version: Option<String>,
    /// True requests an exact version match instead of a compatible one.
    #[serde(default, rename = "match")]
    pub exact_match: bool,
}

/// One `extensions` entry of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Target extension point as `"pluginId.extensionPointId"`.
    #[serde(default)]
    pub point: String,
}

/// One `extension_points` entry of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionPointEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
}

/// One `libraries` entry of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exports: Vec<String>,
}

impl PrerequisiteEntry {
    fn into_prerequisite(self) -> Prerequisite {
        Prerequisite {
            plugin: self.plugin,
            version: self.version,
            exact_match: self.exact_match,
            resolved_version: None,
        }
    }
}

impl ExtensionEntry {
    fn into_extension(self) -> Extension {
        Extension {
            id: self.id,
            name: self.name,
            point: self.point,
            resolved_point: None,
        }
    }
}

impl ExtensionPointEntry {
    fn into_extension_point(self) -> ExtensionPoint {
        ExtensionPoint {
            id: self.id,
            name: self.name,
            schema: self.schema,
            extensions: Vec::new(),
        }
    }
}

impl LibraryEntry {
    fn into_library(self) -> Library {
        Library {
            name: self.name,
            exports: self.exports,
        }
    }
}

impl PluginManifest {
    /// Parse a JSON manifest.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a TOML manifest.
    #[cfg(feature = "toml-manifest")]
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Convert into a plugin descriptor ready for registration.
    pub fn into_descriptor(self) -> PluginDescriptor {
        let mut descriptor = PluginDescriptor::new(&self.id, &self.name, &self.version);
        descriptor.provider_name = self.provider;
        descriptor.requires = self
            .requires
            .into_iter()
            .map(PrerequisiteEntry::into_prerequisite)
            .collect();
        descriptor.extensions = self
            .extensions
            .into_iter()
            .map(ExtensionEntry::into_extension)
            .collect();
        descriptor.extension_points = self
            .extension_points
            .into_iter()
            .map(ExtensionPointEntry::into_extension_point)
            .collect();
        descriptor.libraries = self
            .libraries
            .into_iter()
            .map(LibraryEntry::into_library)
            .collect();
        descriptor
    }
}

impl FragmentManifest {
    /// Parse a JSON manifest.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a TOML manifest.
    #[cfg(feature = "toml-manifest")]
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Convert into a fragment descriptor ready for registration.
    pub fn into_fragment(self) -> FragmentDescriptor {
        let mut fragment = FragmentDescriptor::new(
            &self.id,
            &self.name,
            &self.version,
            &self.plugin,
            &self.plugin_version,
        );
        fragment.requires = self
            .requires
            .into_iter()
            .map(PrerequisiteEntry::into_prerequisite)
            .collect();
        fragment.extensions = self
            .extensions
            .into_iter()
            .map(ExtensionEntry::into_extension)
            .collect();
        fragment.extension_points = self
            .extension_points
            .into_iter()
            .map(ExtensionPointEntry::into_extension_point)
            .collect();
        fragment.libraries = self
            .libraries
            .into_iter()
            .map(LibraryEntry::into_library)
            .collect();
        fragment
    }
}
