//! # Model Registry
//!
//! Holds one [`ModelEntry`] per registered device model, keyed by
//! `name_version`, and answers the questions the rest of the system asks
//! about models:
//!
//! - Which models are supported? ([`ModelRegistry::capabilities`])
//! - Is this concrete path operational state? ([`ModelRegistry::is_read_only`],
//!   [`ModelEntry::is_state_path`])
//! - Which plugin validates configuration for a model? ([`ModelEntry::plugin`])
//!
//! ## Registration Flow
//!
//! 1. `register_model("builtin:testdevice")` opens the plugin via the `PluginLoader`
//! 2. `ModelPlugin::model_data()` yields the identity and capability descriptors
//! 3. `ModelPlugin::schema()["Device"]` is walked once by the `SchemaWalker`
//! 4. The finished entry is published; a same-key entry is replaced

pub mod error;
pub mod model_registry;

pub use error::RegistryError;
pub use model_registry::{ModelEntry, ModelRegistry, RegistrySnapshot};
