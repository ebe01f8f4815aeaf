//! # Schema Trees
//!
//! A device model describes its configuration/state namespace as a tree of
//! [`SchemaNode`]s (containers, lists and leaves), the shape a YANG module
//! takes once compiled. This module owns that tree representation and the
//! algorithms that run over it:
//!
//! ```text
//! SchemaNode tree
//!   │ NamespaceResolver::resolve()  → effective namespace per node
//!   │ PathFormatter::format()       → "/ns:name" or "/name[key=*]" segments
//!   ▼
//! SchemaWalker::read_only_paths()   → BTreeSet of read-only paths
//!
//! concrete path "/interfaces/interface[name=eth0]/state"
//!   │ normalize()
//!   ▼
//! "/interfaces/interface[name=*]/state"  → membership test against the set
//! ```
//!
//! # Example YAML
//!
//! ```yaml
//! name: interfaces
//! kind: container
//! children:
//!   - name: interface
//!     kind: list
//!     key: name
//!     children:
//!       - name: oper-status
//!         kind: leaf
//!         config: read_only
//! ```

pub mod namespace;
pub mod path;
pub mod walker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use namespace::{NamespaceResolver, COMPAT_NAMESPACES};
pub use path::{normalize, PathFormatter};
pub use walker::{SchemaWalker, DEFAULT_MAX_DEPTH};

// ============================================================================
// Node attributes
// ============================================================================

/// The structural kind of a schema node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Leaf,
    Container,
    List,
}

/// Tri-state `config` statement of a node.
///
/// `Unset` inherits from the enclosing context; it never marks a path
/// read-only by itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConfigState {
    Writable,
    ReadOnly,
    #[default]
    Unset,
}

impl ConfigState {
    pub fn is_read_only(self) -> bool {
        self == ConfigState::ReadOnly
    }
}

// ============================================================================
// SchemaNode
// ============================================================================

/// One node of a model's schema tree. Children are owned by their parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaNode {
    /// Node name as it appears in a path segment.
    #[serde(default)]
    pub name: String,

    pub kind: NodeKind,

    #[serde(default, rename = "config")]
    pub config_state: ConfigState,

    /// Declared module namespace, if the schema library populated it.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Declared module prefix (e.g. `oc-aaa`).
    #[serde(default)]
    pub prefix: Option<String>,

    /// Schema-path annotation, e.g. `/openconfig-interfaces/interfaces`.
    /// Its second `/`-delimited segment is a namespace fallback.
    #[serde(default, rename = "annotation")]
    pub namespace_annotation: Option<String>,

    /// Key leaf name. Required for lists.
    #[serde(default, rename = "key")]
    pub list_key: Option<String>,

    #[serde(default)]
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            config_state: ConfigState::Unset,
            namespace: None,
            prefix: None,
            namespace_annotation: None,
            list_key: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(name: &str) -> Self {
        Self::new(name, NodeKind::Leaf)
    }

    pub fn container(name: &str) -> Self {
        Self::new(name, NodeKind::Container)
    }

    pub fn list(name: &str, key: &str) -> Self {
        let mut node = Self::new(name, NodeKind::List);
        node.list_key = Some(key.to_string());
        node
    }

    pub fn with_config(mut self, state: ConfigState) -> Self {
        self.config_state = state;
        self
    }

    pub fn read_only(self) -> Self {
        self.with_config(ConfigState::ReadOnly)
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_annotation(mut self, schema_path: &str) -> Self {
        self.namespace_annotation = Some(schema_path.to_string());
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SchemaNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn is_list(&self) -> bool {
        self.kind == NodeKind::List
    }

    /// Look up a direct child by name. A `module:` qualifier on `name` is ignored.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        let bare = name.rsplit(':').next().unwrap_or(name);
        self.children.iter().find(|c| c.name == bare)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Structural problems found while walking a schema tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A list node without a key leaf.
    #[error("list {path} has no key")]
    MissingListKey { path: String },

    /// A leaf node carrying children.
    #[error("leaf {path} has children")]
    LeafWithChildren { path: String },

    /// Nesting deeper than the walker allows; runaway or cyclic input.
    #[error("schema nesting exceeds {max} levels at {path}")]
    DepthExceeded { path: String, max: usize },

    /// The schema map has no entry under the configured root name.
    #[error("schema has no root entry '{0}'")]
    MissingRoot(String),
}
