//! Plugin loader: turns plugin handles into live [`ModelPlugin`] objects.
//!
//! Handles take two forms:
//! 1. `builtin:<name>`: a statically linked plugin registered as a factory
//! 2. anything else: a path to a YAML [`SchemaDefinitionPlugin`] file
//!
//! The registry never learns which form produced a plugin.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::definition::SchemaDefinitionPlugin;
use super::{ModelPlugin, PluginError};

/// Handle prefix selecting a registered factory.
pub const BUILTIN_SCHEME: &str = "builtin:";

/// Factory for a statically linked plugin.
pub trait PluginFactory: Send + Sync {
    /// Name the factory is selected by (`builtin:<name>`).
    fn name(&self) -> &str;

    /// Create the plugin instance.
    fn create(&self) -> Result<Arc<dyn ModelPlugin>, PluginError>;
}

/// Factory handing out one shared plugin instance.
pub struct StaticPluginFactory {
    name: String,
    plugin: Arc<dyn ModelPlugin>,
}

impl StaticPluginFactory {
    pub fn new(name: &str, plugin: Arc<dyn ModelPlugin>) -> Self {
        Self {
            name: name.to_string(),
            plugin,
        }
    }
}

impl PluginFactory for StaticPluginFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<Arc<dyn ModelPlugin>, PluginError> {
        Ok(Arc::clone(&self.plugin))
    }
}

/// Resolves plugin handles.
#[derive(Default)]
pub struct PluginLoader {
    /// Factories indexed by name
    factories: HashMap<String, Box<dyn PluginFactory>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any factory with the same name.
    pub fn register_factory(&mut self, factory: Box<dyn PluginFactory>) {
        let name = factory.name().to_string();
        self.factories.insert(name, factory);
    }

    /// Names of all registered factories.
    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Open the plugin behind `handle`.
    pub fn open(&self, handle: &str) -> Result<Arc<dyn ModelPlugin>, PluginError> {
        if let Some(name) = handle.strip_prefix(BUILTIN_SCHEME) {
            let factory = self
                .factories
                .get(name)
                .ok_or_else(|| PluginError::NotFound(handle.to_string()))?;
            return factory.create();
        }

        let path = Path::new(handle);
        if !path.is_file() {
            return Err(PluginError::NotFound(handle.to_string()));
        }
        let plugin = SchemaDefinitionPlugin::from_yaml_file(path)?;
        Ok(Arc::new(plugin))
    }

    /// Find definition files (`*.yaml`, `*.yml`) in `dir`, recursively.
    ///
    /// Unreadable entries and symlinked directories are skipped; a missing
    /// directory yields nothing.
    pub fn discover(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if !dir.exists() {
            return found;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cannot read plugin directory {}: {}", dir.display(), e);
                return found;
            }
        };

        for entry in entries {
            let (path, file_type) = match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
                Ok(found) => found,
                Err(e) => {
                    log::warn!("Skipping entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            // Symlinked directories are not followed; they can loop.
            if file_type.is_symlink() && path.is_dir() {
                log::debug!("Skipping symlinked directory {}", path.display());
                continue;
            }
            if file_type.is_dir() {
                found.extend(Self::discover(&path));
            } else if path
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
            {
                found.push(path);
            }
        }

        found.sort();
        found
    }
}
