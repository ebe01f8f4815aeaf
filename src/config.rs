//! Registry configuration.
//!
//! Loaded from the YAML file named by `DEVICE_MODELS_CONFIG`; every field has
//! a default, so the variable and the file are optional.
//!
//! # Example YAML
//!
//! ```yaml
//! root_entry: Device
//! max_schema_depth: 64
//! namespace_overrides:
//!   oc-acl: openconfig-acl
//! plugins:
//!   - builtin:testdevice
//!   - models/devicesim-1.0.0.yaml
//! plugin_dirs:
//!   - /etc/device-models
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{NamespaceResolver, DEFAULT_MAX_DEPTH};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DEVICE_MODELS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for a [`crate::registry::ModelRegistry`] and its startup plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Schema entry each model's read-only paths are extracted from.
    #[serde(default = "default_root_entry")]
    pub root_entry: String,

    /// Maximum schema nesting accepted by the walker.
    #[serde(default = "default_max_schema_depth")]
    pub max_schema_depth: usize,

    /// Extra prefix → namespace mappings, merged over the built-in table.
    #[serde(default)]
    pub namespace_overrides: HashMap<String, String>,

    /// Plugin handles registered at startup.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Directories scanned for definition files at startup.
    #[serde(default)]
    pub plugin_dirs: Vec<PathBuf>,
}

fn default_root_entry() -> String {
    "Device".to_string()
}

fn default_max_schema_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root_entry: default_root_entry(),
            max_schema_depth: default_max_schema_depth(),
            namespace_overrides: HashMap::new(),
            plugins: Vec::new(),
            plugin_dirs: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load from the file named by [`CONFIG_ENV`], or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_yaml_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Namespace resolver with this config's overrides applied.
    pub fn resolver(&self) -> NamespaceResolver {
        NamespaceResolver::with_overrides(&self.namespace_overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = RegistryConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.root_entry, "Device");
        assert_eq!(config.max_schema_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
root_entry: Root
max_schema_depth: 12
namespace_overrides:
  oc-acl: openconfig-acl
plugins:
  - builtin:testdevice
plugin_dirs:
  - /etc/device-models
"#;
        let config = RegistryConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.root_entry, "Root");
        assert_eq!(config.max_schema_depth, 12);
        assert_eq!(config.plugins, vec!["builtin:testdevice"]);
        assert_eq!(config.plugin_dirs, vec![PathBuf::from("/etc/device-models")]);

        let resolver = config.resolver();
        assert_eq!(resolver.compat_namespace("oc-acl"), Some("openconfig-acl"));
        assert_eq!(resolver.compat_namespace("oc-aaa"), Some("openconfig-aaa"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::from_yaml_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "plugins: [a.yaml, b.yaml]\n").unwrap();
        let config = RegistryConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.plugins.len(), 2);
    }
}
