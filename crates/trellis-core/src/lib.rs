pub mod plugin_registry;

// Re-export key public types for easier use by the binary and embedders.
pub use plugin_registry::descriptor::{DescriptorBuilder, PluginDescriptor};
pub use plugin_registry::diagnostics::ResolutionStatus;
pub use plugin_registry::error::PluginRegistryError;
pub use plugin_registry::registry::PluginRegistry;
pub use plugin_registry::resolver::RegistryResolver;
pub use plugin_registry::version::PluginVersion;
