//! # Trellis Plugin Registry
//!
//! Infrastructure for declaring plugins and resolving their prerequisite
//! graph into a consistent, cross-linked registry. A registry is populated
//! with plugin descriptors and fragments (programmatically or from
//! manifests), then handed to the [`RegistryResolver`], which decides a
//! single enabled version per plugin id, merges fragment contributions,
//! annotates prerequisites with the versions chosen for them and attaches
//! extensions to their extension points.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`version`]**: Plugin version identifiers and the exact / compatible
//!   match predicates.
//! - **[`descriptor`]**: The plugin model: descriptors, prerequisites,
//!   fragments, extensions, extension points, libraries.
//! - **[`registry`]**: The [`PluginRegistry`] store the resolver mutates in
//!   place.
//! - **[`validation`]**: Required-attribute checks for descriptors and
//!   fragments.
//! - **[`diagnostics`]**: The [`ResolutionStatus`] accumulator and the
//!   diagnostic kinds a resolution pass can produce.
//! - **[`resolver`]**: The [`RegistryResolver`] driving fragment merging,
//!   constraint propagation, rollback, trimming and cross-linking.
//! - **[`manifest`]**: Declarative plugin and fragment manifests.
//! - **[`loader`]**: Asynchronous population of a registry from manifest
//!   files on disk.
//! - **[`error`]**: Error types for the manifest and loader layer.

pub mod descriptor;
pub mod diagnostics;
pub mod error;
mod fragments;
mod index;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod resolver;
pub mod validation;
pub mod version;

pub use descriptor::{
    DescriptorBuilder, Extension, ExtensionPoint, FragmentDescriptor, Library, MatchRule,
    PluginDescriptor, Prerequisite,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, ResolutionStatus, Severity};
pub use registry::PluginRegistry;
pub use resolver::RegistryResolver;
pub use version::PluginVersion;

// Test module declaration
#[cfg(test)]
mod tests;
