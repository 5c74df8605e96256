//! Plugin registry: setup, exclusion, extension dispatch.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use chipdeck_common::{DecoderPlugin, Notification, PluginInformation};

/// Owns the set of active decoder plugins.
///
/// `configure()` runs each plugin's `setup()` once; a plugin that fails is
/// logged and excluded; the process continues with reduced format
/// support. Extension lookup is case-insensitive and resolves ties by
/// registration order, which makes that order part of the contract.
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn DecoderPlugin>>,
}

impl PluginRegistry {
    /// Set up `plugins` and collect the survivors into a registry.
    ///
    /// Returns the registry plus the `RegistryConfigured` notification to
    /// publish towards the UI layer, carrying one [`PluginInformation`]
    /// (with render handles bound to the plugin instance) per active
    /// plugin.
    pub fn configure(plugins: Vec<Arc<dyn DecoderPlugin>>) -> (PluginRegistry, Notification) {
        let mut active: Vec<Arc<dyn DecoderPlugin>> = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            match plugin.setup() {
                Ok(()) => {
                    info!(plugin = plugin.name(), version = %plugin.version(), "plugin active");
                    active.push(plugin);
                }
                Err(e) => {
                    warn!(plugin = plugin.name(), error = %e, "plugin excluded");
                }
            }
        }

        let infos = active
            .iter()
            .map(|plugin| {
                let settings = Arc::clone(plugin);
                let stats = Arc::clone(plugin);
                let metadata = Arc::clone(plugin);
                PluginInformation {
                    name: plugin.name().to_string(),
                    version: plugin.version(),
                    extensions: plugin
                        .supported_extensions()
                        .iter()
                        .map(|e| e.to_string())
                        .collect(),
                    settings_view: Arc::new(move || settings.render_settings()),
                    stats_view: Arc::new(move || stats.render_stats()),
                    metadata_view: Arc::new(move || metadata.render_metadata()),
                }
            })
            .collect();

        (
            PluginRegistry { plugins: active },
            Notification::RegistryConfigured(infos),
        )
    }

    /// Find the plugin for a dotted extension, case-insensitively.
    ///
    /// The first registered plugin whose extension set contains the match
    /// wins.
    pub fn find_by_extension(&self, extension: &str) -> Option<Arc<dyn DecoderPlugin>> {
        let wanted = extension.to_ascii_lowercase();
        self.plugins
            .iter()
            .find(|p| p.supported_extensions().contains(&wanted.as_str()))
            .cloned()
    }

    /// Find the plugin for a file path by its extension.
    pub fn find_for_path(&self, path: &Path) -> Option<Arc<dyn DecoderPlugin>> {
        let extension = path.extension()?.to_str()?;
        self.find_by_extension(&format!(".{extension}"))
    }

    /// Union of all active plugins' extensions, published once at startup
    /// so the browser can pre-filter unsupported files.
    pub fn supported_extensions(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.supported_extensions().iter().map(|e| e.to_string()))
            .collect()
    }

    /// Active plugins in registration order.
    pub fn plugins(&self) -> &[Arc<dyn DecoderPlugin>] {
        &self.plugins
    }

    /// Release engine-global plugin resources at application shutdown.
    pub fn shutdown(&self) {
        for plugin in &self.plugins {
            plugin.cleanup();
        }
    }
}
