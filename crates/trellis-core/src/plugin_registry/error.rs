use std::path::PathBuf;

use crate::plugin_registry::version::VersionError;

/// Errors surfaced by the manifest and loader layer.
///
/// The resolver core itself never fails with one of these: resolution faults
/// are reported as diagnostics in the returned
/// [`ResolutionStatus`](crate::plugin_registry::diagnostics::ResolutionStatus).
#[derive(Debug, thiserror::Error)]
pub enum PluginRegistryError {
    #[error("Manifest error for '{path}': {message}")]
    ManifestError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<PluginRegistryErrorSource>>,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported manifest format: '{0}'")]
    UnsupportedFormat(PathBuf),

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),
}

#[derive(Debug, thiserror::Error)]
pub enum PluginRegistryErrorSource {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "toml-manifest")]
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Other: {0}")]
    Other(String),
}
