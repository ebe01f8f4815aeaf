//! Schema definition plugins: device models declared in YAML.
//!
//! A definition file lets a new device model be added without recompiling:
//! it carries the model identity, the capability descriptors to advertise,
//! and the schema tree itself.
//!
//! # Example YAML
//!
//! ```yaml
//! model:
//!   name: testdevice
//!   version: 1.0.0
//!   descriptors:
//!     - name: openconfig-interfaces
//!       version: 2.4.1
//!       organization: OpenConfig working group
//! schema:
//!   Device:
//!     kind: container
//!     children:
//!       - name: interfaces
//!         kind: container
//!         annotation: /openconfig-interfaces/interfaces
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ConfigTree, ModelData, ModelPlugin, PluginError, SchemaMap, ValidationOption};
use crate::schema::{ConfigState, NodeKind, SchemaNode};

/// On-disk layout of a definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub model: ModelData,

    /// Schema entry that configuration trees are validated against.
    #[serde(default = "default_root")]
    pub root: String,

    pub schema: SchemaMap,
}

fn default_root() -> String {
    "Device".to_string()
}

/// A [`ModelPlugin`] backed by a [`ModelDefinition`].
#[derive(Debug, Clone)]
pub struct SchemaDefinitionPlugin {
    definition: ModelDefinition,
}

impl SchemaDefinitionPlugin {
    /// Build a plugin from an already parsed definition.
    pub fn new(mut definition: ModelDefinition) -> Result<Self, PluginError> {
        if definition.model.name.is_empty() || definition.model.version.is_empty() {
            return Err(PluginError::Definition(
                "model name and version are required".to_string(),
            ));
        }
        // Map keys name the root entries; the nodes themselves may omit it.
        for (name, node) in definition.schema.iter_mut() {
            if node.name.is_empty() {
                node.name = name.clone();
            }
        }
        Ok(Self { definition })
    }

    /// Parse a definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PluginError> {
        let definition: ModelDefinition = serde_yaml::from_str(yaml)?;
        Self::new(definition)
    }

    /// Parse a definition from a YAML file on disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    fn root(&self) -> Result<&SchemaNode, PluginError> {
        self.definition.schema.get(&self.definition.root).ok_or_else(|| {
            PluginError::Definition(format!("no schema entry '{}'", self.definition.root))
        })
    }
}

impl ModelPlugin for SchemaDefinitionPlugin {
    fn model_data(&self) -> ModelData {
        self.definition.model.clone()
    }

    fn unmarshal_config(&self, raw: &[u8]) -> Result<ConfigTree, PluginError> {
        let tree: Value = serde_json::from_slice(raw)?;
        if !tree.is_object() {
            return Err(PluginError::Validation {
                path: "/".to_string(),
                reason: "configuration must be a JSON object".to_string(),
            });
        }
        Ok(tree)
    }

    fn validate(&self, tree: &ConfigTree, options: &[ValidationOption]) -> Result<(), PluginError> {
        let checker = TreeChecker {
            allow_read_only: options.contains(&ValidationOption::AllowReadOnlyWrites),
            ignore_unknown: options.contains(&ValidationOption::IgnoreUnknownPaths),
        };
        let members = tree.as_object().ok_or_else(|| PluginError::Validation {
            path: "/".to_string(),
            reason: "configuration must be a JSON object".to_string(),
        })?;
        checker.check_members(self.root()?, members, ConfigState::Unset, "")
    }

    fn schema(&self) -> Result<SchemaMap, PluginError> {
        Ok(self.definition.schema.clone())
    }
}

// ============================================================================
// Validation
// ============================================================================

struct TreeChecker {
    allow_read_only: bool,
    ignore_unknown: bool,
}

impl TreeChecker {
    fn check_members(
        &self,
        node: &SchemaNode,
        members: &Map<String, Value>,
        parent_state: ConfigState,
        parent_path: &str,
    ) -> Result<(), PluginError> {
        for (name, value) in members {
            let path = format!("{}/{}", parent_path, name);
            let Some(child) = node.child(name) else {
                if self.ignore_unknown {
                    continue;
                }
                return Err(invalid(path, "unknown node"));
            };

            let state = if parent_state.is_read_only() {
                ConfigState::ReadOnly
            } else {
                child.config_state
            };
            if state.is_read_only() && !self.allow_read_only {
                return Err(invalid(path, "node is read-only"));
            }

            match child.kind {
                NodeKind::Leaf => {
                    if value.is_object() {
                        return Err(invalid(path, "expected a leaf value"));
                    }
                }
                NodeKind::Container => {
                    let inner = value
                        .as_object()
                        .ok_or_else(|| invalid(path.clone(), "expected a container"))?;
                    self.check_members(child, inner, state, &path)?;
                }
                NodeKind::List => {
                    let key = child.list_key.as_deref().unwrap_or_default();
                    let entries = value
                        .as_array()
                        .ok_or_else(|| invalid(path.clone(), "expected a list"))?;
                    for entry in entries {
                        let inner = entry
                            .as_object()
                            .ok_or_else(|| invalid(path.clone(), "expected a list entry"))?;
                        let key_value = inner
                            .get(key)
                            .ok_or_else(|| invalid(path.clone(), "list entry has no key"))?;
                        let entry_path = format!("{}[{}={}]", path, key, display_key(key_value));
                        self.check_members(child, inner, state, &entry_path)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn invalid(path: String, reason: &str) -> PluginError {
    PluginError::Validation {
        path,
        reason: reason.to_string(),
    }
}

fn display_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"
model:
  name: testdevice
  version: 1.0.0
  extra: test fixture
  descriptors:
    - name: openconfig-interfaces
      version: 2.4.1
      organization: OpenConfig working group
    - name: openconfig-system
      version: 0.7.0
      organization: OpenConfig working group
schema:
  Device:
    kind: container
    children:
      - name: interfaces
        kind: container
        children:
          - name: interface
            kind: list
            key: name
            children:
              - name: name
                kind: leaf
              - name: description
                kind: leaf
              - name: oper-status
                kind: leaf
                config: read_only
      - name: system
        kind: container
        children:
          - name: hostname
            kind: leaf
          - name: state
            kind: container
            config: read_only
            children:
              - name: uptime
                kind: leaf
"#;

    fn plugin() -> SchemaDefinitionPlugin {
        SchemaDefinitionPlugin::from_yaml(DEFINITION).unwrap()
    }

    #[test]
    fn test_parse_definition() {
        let plugin = plugin();
        let data = plugin.model_data();
        assert_eq!(data.name, "testdevice");
        assert_eq!(data.version, "1.0.0");
        assert_eq!(data.descriptors.len(), 2);
        assert_eq!(plugin.definition().root, "Device");

        let schema = plugin.schema().unwrap();
        let root = schema.get("Device").unwrap();
        assert_eq!(root.name, "Device");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_missing_identity_rejected() {
        let yaml = "model:\n  name: ''\n  version: '1'\nschema: {}\n";
        let err = SchemaDefinitionPlugin::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, PluginError::Definition(_)));
    }

    #[test]
    fn test_unmarshal_requires_object() {
        let plugin = plugin();
        assert!(plugin.unmarshal_config(br#"{"system": {}}"#).is_ok());
        assert!(matches!(
            plugin.unmarshal_config(b"[1, 2]"),
            Err(PluginError::Validation { .. })
        ));
        assert!(matches!(
            plugin.unmarshal_config(b"{not json"),
            Err(PluginError::Unmarshal(_))
        ));
    }

    #[test]
    fn test_validate_accepts_writable_config() {
        let plugin = plugin();
        let tree = plugin
            .unmarshal_config(
                br#"{
                    "system": {"hostname": "switch1"},
                    "interfaces": {"interface": [
                        {"name": "eth0", "description": "uplink"}
                    ]}
                }"#,
            )
            .unwrap();
        plugin.validate(&tree, &[]).unwrap();
    }

    #[test]
    fn test_validate_rejects_read_only_leaf() {
        let plugin = plugin();
        let tree = serde_json::json!({
            "interfaces": {"interface": [{"name": "eth0", "oper-status": "UP"}]}
        });
        match plugin.validate(&tree, &[]) {
            Err(PluginError::Validation { path, .. }) => {
                assert_eq!(path, "/interfaces/interface[name=eth0]/oper-status");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        plugin
            .validate(&tree, &[ValidationOption::AllowReadOnlyWrites])
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_inherited_read_only() {
        let plugin = plugin();
        let tree = serde_json::json!({"system": {"state": {"uptime": 5}}});
        match plugin.validate(&tree, &[]) {
            Err(PluginError::Validation { path, .. }) => assert_eq!(path, "/system/state"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_unknown_nodes() {
        let plugin = plugin();
        let tree = serde_json::json!({"system": {"hostname": "a", "motd": "hi"}});
        assert!(matches!(
            plugin.validate(&tree, &[]),
            Err(PluginError::Validation { .. })
        ));
        plugin
            .validate(&tree, &[ValidationOption::IgnoreUnknownPaths])
            .unwrap();
    }

    #[test]
    fn test_validate_list_entry_needs_key() {
        let plugin = plugin();
        let tree = serde_json::json!({"interfaces": {"interface": [{"description": "x"}]}});
        match plugin.validate(&tree, &[]) {
            Err(PluginError::Validation { reason, .. }) => assert_eq!(reason, "list entry has no key"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testdevice.yaml");
        std::fs::write(&path, DEFINITION).unwrap();
        let plugin = SchemaDefinitionPlugin::from_yaml_file(&path).unwrap();
        assert_eq!(plugin.model_data().identity().key(), "testdevice_1.0.0");
    }
}
