#![cfg(test)]

use crate::plugin_registry::descriptor::MatchRule;
use crate::plugin_registry::manifest::{FragmentManifest, PluginManifest};

#[test]
fn test_plugin_manifest_from_json() {
    let text = r#"{
        "id": "tools",
        "name": "Tools",
        "version": "1.2.0",
        "provider": "Example Inc",
        "requires": [
            { "plugin": "core", "version": "1.0.0", "match": true },
            { "plugin": "ui" }
        ],
        "extensions": [
            { "id": "open", "point": "core.commands" }
        ],
        "extension-points": [
            { "id": "formats", "name": "File Formats" }
        ],
        "libraries": [
            { "name": "tools.jar", "exports": ["*"] }
        ]
    }"#;

    let descriptor = PluginManifest::from_json(text).unwrap().into_descriptor();
    assert_eq!(descriptor.id, "tools");
    assert_eq!(descriptor.name, "Tools");
    assert_eq!(descriptor.version, "1.2.0");
    assert_eq!(descriptor.provider_name.as_deref(), Some("Example Inc"));
    assert!(descriptor.enabled);

    assert_eq!(descriptor.requires.len(), 2);
    assert_eq!(descriptor.requires[0].plugin, "core");
    assert_eq!(descriptor.requires[0].match_rule(), MatchRule::Exact);
    assert_eq!(descriptor.requires[1].match_rule(), MatchRule::Latest);

    assert_eq!(descriptor.extensions.len(), 1);
    assert_eq!(descriptor.extensions[0].point, "core.commands");
    assert!(descriptor.extensions[0].resolved_point.is_none());

    assert_eq!(descriptor.extension_points.len(), 1);
    assert_eq!(descriptor.extension_points[0].id, "formats");

    assert_eq!(descriptor.libraries.len(), 1);
    assert_eq!(descriptor.libraries[0].exports, vec!["*".to_string()]);
}

#[test]
fn test_plugin_manifest_is_lenient() {
    // missing attributes surface later as validator diagnostics, not here
    let descriptor = PluginManifest::from_json("{}").unwrap().into_descriptor();
    assert!(descriptor.id.is_empty());
    assert!(descriptor.name.is_empty());
    assert!(descriptor.version.is_empty());
    assert!(descriptor.requires.is_empty());
}

#[test]
fn test_fragment_manifest_from_json() {
    let text = r#"{
        "id": "tools-linux",
        "name": "Tools for Linux",
        "version": "1.0.0",
        "plugin": "tools",
        "plugin-version": "1.2.0",
        "libraries": [ { "name": "linux.jar" } ]
    }"#;

    let fragment = FragmentManifest::from_json(text).unwrap().into_fragment();
    assert_eq!(fragment.id, "tools-linux");
    assert_eq!(fragment.plugin_id, "tools");
    assert_eq!(fragment.plugin_version, "1.2.0");
    assert_eq!(fragment.libraries.len(), 1);
}

#[test]
fn test_snake_case_aliases_accepted() {
    let text = r#"{
        "id": "tools",
        "name": "Tools",
        "version": "1.0.0",
        "extension_points": [ { "id": "formats", "name": "Formats" } ]
    }"#;
    let manifest = PluginManifest::from_json(text).unwrap();
    assert_eq!(manifest.extension_points.len(), 1);

    let text = r#"{
        "id": "f", "name": "F", "version": "1.0.0",
        "plugin": "tools", "plugin_version": "1.0.0"
    }"#;
    let manifest = FragmentManifest::from_json(text).unwrap();
    assert_eq!(manifest.plugin_version, "1.0.0");
}

#[cfg(feature = "toml-manifest")]
#[test]
fn test_plugin_manifest_from_toml() {
    let text = r#"
        id = "tools"
        name = "Tools"
        version = "1.2.0"

        [[requires]]
        plugin = "core"
        version = "1.0.0"
        match = true

        [[extension_points]]
        id = "formats"
        name = "File Formats"
    "#;

    let descriptor = PluginManifest::from_toml(text).unwrap().into_descriptor();
    assert_eq!(descriptor.id, "tools");
    assert_eq!(descriptor.requires.len(), 1);
    assert_eq!(descriptor.requires[0].match_rule(), MatchRule::Exact);
    assert_eq!(descriptor.extension_points.len(), 1);
}

#[cfg(feature = "toml-manifest")]
#[test]
fn test_fragment_manifest_from_toml() {
    let text = r#"
        id = "tools-linux"
        name = "Tools for Linux"
        version = "1.0.0"
        plugin = "tools"
        plugin-version = "1.2.0"
    "#;

    let fragment = FragmentManifest::from_toml(text).unwrap().into_fragment();
    assert_eq!(fragment.plugin_id, "tools");
    assert_eq!(fragment.plugin_version, "1.2.0");
}
