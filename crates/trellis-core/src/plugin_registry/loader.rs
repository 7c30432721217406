use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::warn;
use tokio::fs;

use crate::plugin_registry::error::{PluginRegistryError, PluginRegistryErrorSource};
use crate::plugin_registry::manifest::{FragmentManifest, PluginManifest};
use crate::plugin_registry::registry::PluginRegistry;

/// A source of plugin and fragment descriptors for a [`PluginRegistry`].
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Load every descriptor this source provides into `registry`, returning
    /// how many plugins and fragments were added.
    async fn populate(&self, registry: &mut PluginRegistry) -> Result<usize, PluginRegistryError>;
}

/// Loads manifests from a directory tree: every direct child directory of
/// the root is scanned for one `plugin.json` or `fragment.json` manifest
/// (`.toml` variants with the `toml-manifest` feature). Directories are
/// visited in sorted order so the registry contents are deterministic.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RegistrySource for DirectorySource {
    async fn populate(&self, registry: &mut PluginRegistry) -> Result<usize, PluginRegistryError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|source| {
            PluginRegistryError::Io {
                path: self.root.clone(),
                source,
            }
        })?;

        let mut directories = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| {
            PluginRegistryError::Io {
                path: self.root.clone(),
                source,
            }
        })? {
            let path = entry.path();
            if path.is_dir() {
                directories.push(path);
            }
        }
        directories.sort();

        let mut loaded = 0;
        for directory in directories {
            if let Some(path) = find_manifest(&directory, "plugin").await {
                let manifest: PluginManifest = read_manifest(&path).await?;
                registry.add_plugin(manifest.into_descriptor());
                loaded += 1;
            } else if let Some(path) = find_manifest(&directory, "fragment").await {
                let manifest: FragmentManifest = read_manifest(&path).await?;
                registry.add_fragment(manifest.into_fragment());
                loaded += 1;
            } else {
                warn!(
                    "no plugin or fragment manifest found under {}",
                    directory.display()
                );
            }
        }
        Ok(loaded)
    }
}

/// Look for `<stem>.json` (and `<stem>.toml` when enabled) in a directory.
async fn find_manifest(directory: &Path, stem: &str) -> Option<PathBuf> {
    let json = directory.join(format!("{stem}.json"));
    if fs::try_exists(&json).await.unwrap_or(false) {
        return Some(json);
    }
    #[cfg(feature = "toml-manifest")]
    {
        let toml = directory.join(format!("{stem}.toml"));
        if fs::try_exists(&toml).await.unwrap_or(false) {
            return Some(toml);
        }
    }
    None
}

async fn read_manifest<T>(path: &Path) -> Result<T, PluginRegistryError>
where
    T: serde::de::DeserializeOwned,
{
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| PluginRegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_manifest(path, &text)
}

/// Parse a manifest from text, dispatching on the file extension.
pub fn parse_manifest<T>(path: &Path, text: &str) -> Result<T, PluginRegistryError>
where
    T: serde::de::DeserializeOwned,
{
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(text)
            .map_err(|e| manifest_error(path, PluginRegistryErrorSource::Json(e))),
        #[cfg(feature = "toml-manifest")]
        Some("toml") => toml::from_str(text)
            .map_err(|e| manifest_error(path, PluginRegistryErrorSource::Toml(e))),
        _ => Err(PluginRegistryError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn manifest_error(path: &Path, source: PluginRegistryErrorSource) -> PluginRegistryError {
    PluginRegistryError::ManifestError {
        path: path.to_path_buf(),
        message: source.to_string(),
        source: Some(Box::new(source)),
    }
}
