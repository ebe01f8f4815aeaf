//! Model Registry: the process-wide set of registered device models.
//!
//! Entries are immutable once published. Readers grab an `Arc` snapshot of
//! the entry map and never hold a lock while using it; registration builds
//! the new entry outside the lock and swaps in a new map under a single
//! write lock.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RegistryError;
use crate::config::RegistryConfig;
use crate::plugin::{
    model_key, CapabilityDescriptor, ModelIdentity, ModelPlugin, PluginError, PluginLoader,
};
use crate::schema::{normalize, NamespaceResolver, SchemaError, SchemaWalker, DEFAULT_MAX_DEPTH};

/// Immutable view of all registered models, keyed by model key.
pub type RegistrySnapshot = Arc<HashMap<String, Arc<ModelEntry>>>;

// ============================================================================
// ModelEntry
// ============================================================================

/// One registered model.
pub struct ModelEntry {
    identity: ModelIdentity,
    capability_data: Vec<CapabilityDescriptor>,
    /// Wildcarded read-only paths, computed once at registration
    read_only_paths: BTreeSet<String>,
    plugin: Arc<dyn ModelPlugin>,
}

impl ModelEntry {
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    pub fn key(&self) -> String {
        self.identity.key()
    }

    pub fn capability_data(&self) -> &[CapabilityDescriptor] {
        &self.capability_data
    }

    pub fn read_only_paths(&self) -> &BTreeSet<String> {
        &self.read_only_paths
    }

    /// The plugin, for unmarshalling and validating configuration.
    pub fn plugin(&self) -> &Arc<dyn ModelPlugin> {
        &self.plugin
    }

    /// Whether `path` (with or without concrete key values) is one of the
    /// model's read-only paths.
    pub fn is_read_only(&self, path: &str) -> bool {
        self.read_only_paths.contains(&normalize(path))
    }

    /// Whether `path` is operational state: read-only itself or below a
    /// read-only container or list.
    pub fn is_state_path(&self, path: &str) -> bool {
        let normalized = normalize(path);
        if self.read_only_paths.contains(&normalized) {
            return true;
        }
        // Key values are wildcarded, so every '/' is a segment boundary.
        normalized
            .match_indices('/')
            .filter(|(i, _)| *i > 0)
            .any(|(i, _)| self.read_only_paths.contains(&normalized[..i]))
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("identity", &self.identity)
            .field("capability_data", &self.capability_data)
            .field("read_only_paths", &self.read_only_paths.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ModelRegistry
// ============================================================================

/// Registry of device models.
///
/// Models are loaded once (at startup or through an administrative call)
/// and retained for the life of the process; there is no unregister.
pub struct ModelRegistry {
    entries: RwLock<RegistrySnapshot>,
    loader: PluginLoader,
    resolver: NamespaceResolver,
    /// Schema entry the walk starts from
    root_entry: String,
    max_depth: usize,
}

impl ModelRegistry {
    /// Create an empty registry with default settings.
    pub fn new(loader: PluginLoader) -> Self {
        Self {
            entries: RwLock::new(Arc::new(HashMap::new())),
            loader,
            resolver: NamespaceResolver::new(),
            root_entry: "Device".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create an empty registry configured by `config`.
    pub fn from_config(config: &RegistryConfig, loader: PluginLoader) -> Self {
        Self {
            entries: RwLock::new(Arc::new(HashMap::new())),
            loader,
            resolver: config.resolver(),
            root_entry: config.root_entry.clone(),
            max_depth: config.max_schema_depth,
        }
    }

    pub fn resolver(&self) -> &NamespaceResolver {
        &self.resolver
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Open the plugin behind `handle` and register its model.
    ///
    /// Returns the model's `(name, version)`. A model already registered
    /// under the same key is replaced.
    pub fn register_model(&self, handle: &str) -> Result<ModelIdentity, RegistryError> {
        tracing::info!(handle, "Loading model plugin");
        let plugin = self.loader.open(handle).map_err(|source| {
            tracing::warn!(handle, error = %source, "Unable to load model plugin");
            RegistryError::PluginLoad {
                handle: handle.to_string(),
                source,
            }
        })?;
        self.register_plugin(plugin)
    }

    /// Register an already constructed plugin.
    pub fn register_plugin(
        &self,
        plugin: Arc<dyn ModelPlugin>,
    ) -> Result<ModelIdentity, RegistryError> {
        let data = plugin.model_data();
        let identity = data.identity();
        let key = identity.key();

        let read_only_paths = self.extract_read_only_paths(plugin.as_ref()).map_err(|source| {
            tracing::warn!(model = %key, error = %source, "Error loading schema from model plugin");
            RegistryError::SchemaExtraction {
                model: key.clone(),
                source,
            }
        })?;

        let path_count = read_only_paths.len();
        let entry = Arc::new(ModelEntry {
            identity: identity.clone(),
            capability_data: data.descriptors,
            read_only_paths,
            plugin,
        });

        if self.publish(key.clone(), entry) {
            tracing::warn!(model = %key, "Replaced previously registered model");
        }
        tracing::info!(
            "Model {} {} loaded. {} read only paths",
            identity.name,
            identity.version,
            path_count
        );
        Ok(identity)
    }

    /// Register every handle in `handles`, logging failures.
    ///
    /// Returns how many registrations succeeded.
    pub fn register_all<I, S>(&self, handles: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        handles
            .into_iter()
            .filter(|handle| self.register_model(handle.as_ref()).is_ok())
            .count()
    }

    /// Register the plugins and plugin directories named by `config`.
    pub fn load_configured(&self, config: &RegistryConfig) -> usize {
        let mut loaded = self.register_all(&config.plugins);
        for dir in &config.plugin_dirs {
            let files = PluginLoader::discover(dir);
            loaded += self.register_all(files.iter().filter_map(|p| p.to_str()));
        }
        loaded
    }

    fn extract_read_only_paths(
        &self,
        plugin: &dyn ModelPlugin,
    ) -> Result<BTreeSet<String>, PluginError> {
        let schema = plugin.schema()?;
        let root = schema
            .get(&self.root_entry)
            .ok_or_else(|| SchemaError::MissingRoot(self.root_entry.clone()))?;
        let paths = SchemaWalker::new(&self.resolver)
            .with_max_depth(self.max_depth)
            .read_only_paths(root)?;
        Ok(paths)
    }

    /// Insert or replace under the write lock. Returns true on replace.
    fn publish(&self, key: String, entry: Arc<ModelEntry>) -> bool {
        let mut guard = self.entries.write();
        let mut next: HashMap<String, Arc<ModelEntry>> = (**guard).clone();
        let replaced = next.insert(key, entry).is_some();
        *guard = Arc::new(next);
        replaced
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current set of entries. Later registrations do not affect it.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.entries.read().clone()
    }

    /// Aggregated capability descriptors of all models.
    ///
    /// Descriptors are deduplicated by `(name, version)`; when two models
    /// declare the same one, whichever is visited last wins. Order is
    /// unspecified.
    pub fn capabilities(&self) -> Vec<CapabilityDescriptor> {
        let snapshot = self.snapshot();
        let mut by_key: HashMap<String, CapabilityDescriptor> = HashMap::new();
        for entry in snapshot.values() {
            for descriptor in &entry.capability_data {
                by_key.insert(descriptor.key(), descriptor.clone());
            }
        }
        by_key.into_values().collect()
    }

    pub fn model(&self, key: &str) -> Option<Arc<ModelEntry>> {
        self.entries.read().get(key).cloned()
    }

    pub fn model_by_identity(&self, name: &str, version: &str) -> Option<Arc<ModelEntry>> {
        self.model(&model_key(name, version))
    }

    /// Identities of all registered models, sorted by key.
    pub fn models(&self) -> Vec<ModelIdentity> {
        let snapshot = self.snapshot();
        let mut keys: Vec<&String> = snapshot.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| snapshot[k].identity.clone())
            .collect()
    }

    pub fn read_only_paths(&self, key: &str) -> Option<BTreeSet<String>> {
        self.model(key).map(|entry| entry.read_only_paths.clone())
    }

    /// Whether `path` is read-only in model `key`; `None` for unknown models.
    pub fn is_read_only(&self, key: &str, path: &str) -> Option<bool> {
        self.model(key).map(|entry| entry.is_read_only(path))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models())
            .field("root_entry", &self.root_entry)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
