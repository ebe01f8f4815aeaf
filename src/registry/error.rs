//! Registry errors.

use thiserror::Error;

use crate::plugin::PluginError;

/// Errors returned by model registration. The registry is left unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The handle could not be opened or did not yield a model plugin.
    #[error("Unable to load model plugin {handle}: {source}")]
    PluginLoad {
        handle: String,
        #[source]
        source: PluginError,
    },

    /// The plugin's schema could not be obtained or walked.
    #[error("Error extracting schema of model {model}: {source}")]
    SchemaExtraction {
        model: String,
        #[source]
        source: PluginError,
    },
}

impl RegistryError {
    /// Model key or plugin handle the error refers to.
    pub fn subject(&self) -> &str {
        match self {
            RegistryError::PluginLoad { handle, .. } => handle,
            RegistryError::SchemaExtraction { model, .. } => model,
        }
    }
}
