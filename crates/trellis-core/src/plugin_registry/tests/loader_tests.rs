#![cfg(test)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::plugin_registry::error::PluginRegistryError;
use crate::plugin_registry::loader::{DirectorySource, RegistrySource};
use crate::plugin_registry::registry::PluginRegistry;
use crate::plugin_registry::resolver::RegistryResolver;

fn write_manifest(root: &Path, directory: &str, file: &str, contents: &str) {
    let dir = root.join(directory);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), contents).unwrap();
}

#[tokio::test]
async fn test_populate_from_directory_tree() {
    let root = tempdir().unwrap();
    write_manifest(
        root.path(),
        "core",
        "plugin.json",
        r#"{ "id": "core", "name": "Core", "version": "1.0.0" }"#,
    );
    write_manifest(
        root.path(),
        "tools",
        "plugin.json",
        r#"{
            "id": "tools", "name": "Tools", "version": "1.0.0",
            "requires": [ { "plugin": "core" } ]
        }"#,
    );
    write_manifest(
        root.path(),
        "core-linux",
        "fragment.json",
        r#"{
            "id": "core-linux", "name": "Core for Linux", "version": "1.0.0",
            "plugin": "core", "plugin-version": "1.0.0"
        }"#,
    );
    fs::create_dir_all(root.path().join("empty")).unwrap();

    let mut registry = PluginRegistry::new();
    let loaded = DirectorySource::new(root.path())
        .populate(&mut registry)
        .await
        .unwrap();

    assert_eq!(loaded, 3);
    assert_eq!(registry.plugin_count(), 2);
    assert_eq!(registry.fragment_count(), 1);

    // directories are visited in sorted order
    let ids: Vec<String> = registry.descriptors().map(|(_, pd)| pd.id.clone()).collect();
    assert_eq!(ids, vec!["core".to_string(), "tools".to_string()]);

    // a loaded registry resolves cleanly
    let status = RegistryResolver::new().resolve(&mut registry);
    assert!(status.is_ok(), "unexpected diagnostics: {}", status);
}

#[tokio::test]
async fn test_populate_missing_root_is_io_error() {
    let root = tempdir().unwrap();
    let missing = root.path().join("nowhere");
    let mut registry = PluginRegistry::new();
    let result = DirectorySource::new(&missing).populate(&mut registry).await;
    assert!(matches!(result, Err(PluginRegistryError::Io { .. })));
}

#[tokio::test]
async fn test_populate_reports_malformed_manifest() {
    let root = tempdir().unwrap();
    write_manifest(root.path(), "broken", "plugin.json", "{ not json");

    let mut registry = PluginRegistry::new();
    let result = DirectorySource::new(root.path()).populate(&mut registry).await;
    assert!(matches!(result, Err(PluginRegistryError::ManifestError { .. })));
}

#[cfg(feature = "toml-manifest")]
#[tokio::test]
async fn test_populate_accepts_toml_manifests() {
    let root = tempdir().unwrap();
    write_manifest(
        root.path(),
        "core",
        "plugin.toml",
        "id = \"core\"\nname = \"Core\"\nversion = \"1.0.0\"\n",
    );

    let mut registry = PluginRegistry::new();
    let loaded = DirectorySource::new(root.path()).populate(&mut registry).await.unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(registry.plugin_count(), 1);
}
