//! # device-models
//!
//! A registry of pluggable device models. Each model plugin supplies its
//! identity, capability descriptors, configuration marshalling/validation
//! and schema tree; the registry derives, once per model, the set of paths
//! that are read-only (operational state) and lets callers test concrete
//! instance paths against that set regardless of list-key values.

pub mod config;
pub mod opstate;
pub mod plugin;
pub mod registry;
pub mod schema;
pub mod server;

pub use config::RegistryConfig;
pub use plugin::{CapabilityDescriptor, ModelData, ModelIdentity, ModelPlugin};
pub use registry::{ModelEntry, ModelRegistry, RegistryError};
pub use schema::{normalize, ConfigState, NodeKind, SchemaNode};

/// Crate version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
