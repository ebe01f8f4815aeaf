//! # Model Plugins
//!
//! A model plugin supplies everything the system knows about one device
//! model: its identity, the capability descriptors it advertises, the
//! marshalling and validation of configuration trees, and its schema.
//!
//! The registry only consumes [`ModelPlugin::model_data`] and
//! [`ModelPlugin::schema`]; unmarshalling and validation are passed through
//! to callers outside the registry.
//!
//! ## Obtaining plugins
//!
//! ```text
//! handle "builtin:testdevice"   → PluginFactory registered by name
//! handle "models/router.yaml"   → SchemaDefinitionPlugin read from disk
//!   ↓  PluginLoader::open()
//! Arc<dyn ModelPlugin>
//! ```

pub mod definition;
pub mod loader;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{SchemaError, SchemaNode};

pub use definition::SchemaDefinitionPlugin;
pub use loader::{PluginFactory, PluginLoader, StaticPluginFactory, BUILTIN_SCHEME};

/// Registry key for a model: `name + "_" + version`.
pub fn model_key(name: &str, version: &str) -> String {
    format!("{}_{}", name, version)
}

/// A configuration tree produced by [`ModelPlugin::unmarshal_config`].
pub type ConfigTree = Value;

/// Schema roots of a model, keyed by entry name (normally `"Device"`).
pub type SchemaMap = HashMap<String, SchemaNode>;

// ============================================================================
// Identity & capability metadata
// ============================================================================

/// `(name, version)` of a registered model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelIdentity {
    pub name: String,
    pub version: String,
}

impl ModelIdentity {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn key(&self) -> String {
        model_key(&self.name, &self.version)
    }
}

impl std::fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A model advertised to clients in a capabilities response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub organization: String,
}

impl CapabilityDescriptor {
    pub fn new(name: &str, version: &str, organization: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            organization: organization.to_string(),
        }
    }

    pub fn key(&self) -> String {
        model_key(&self.name, &self.version)
    }
}

/// Everything a plugin reports about its model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelData {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub descriptors: Vec<CapabilityDescriptor>,
    /// Free-form plugin metadata (build info, source module list, ...)
    #[serde(default)]
    pub extra: String,
}

impl ModelData {
    pub fn identity(&self) -> ModelIdentity {
        ModelIdentity::new(&self.name, &self.version)
    }
}

// ============================================================================
// ModelPlugin
// ============================================================================

/// Options accepted by [`ModelPlugin::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOption {
    /// Accept values at read-only (state) paths.
    AllowReadOnlyWrites,
    /// Skip members that have no schema node.
    IgnoreUnknownPaths,
}

/// The capability set every device model plugin implements.
pub trait ModelPlugin: Send + Sync {
    /// Model name, version, advertised descriptors and extra metadata.
    fn model_data(&self) -> ModelData;

    /// Parse raw configuration into a tree.
    fn unmarshal_config(&self, raw: &[u8]) -> Result<ConfigTree, PluginError>;

    /// Validate a configuration tree against the model.
    fn validate(&self, tree: &ConfigTree, options: &[ValidationOption]) -> Result<(), PluginError>;

    /// The schema roots of the model.
    fn schema(&self) -> Result<SchemaMap, PluginError>;
}

/// Errors raised by plugins and while obtaining them.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A handle did not name any known plugin source.
    #[error("no plugin found for handle '{0}'")]
    NotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A definition file is missing required content.
    #[error("invalid model definition: {0}")]
    Definition(String),

    /// Raw configuration could not be parsed.
    #[error("unmarshal error: {0}")]
    Unmarshal(#[from] serde_json::Error),

    /// A configuration tree violates the model.
    #[error("validation failed at {path}: {reason}")]
    Validation { path: String, reason: String },

    /// The plugin's schema is not available or malformed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}
