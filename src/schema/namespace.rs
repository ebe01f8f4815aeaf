//! Namespace resolution for schema nodes.
//!
//! A node's effective namespace decides whether its path segment is
//! qualified (`ns:name`) or bare. Sources are tried in order:
//! 1. The declared namespace
//! 2. The prefix compatibility table
//! 3. The schema-path annotation (second `/` segment)
//! 4. The parent's namespace

use std::collections::HashMap;

use super::SchemaNode;

/// Prefixes whose namespace the upstream schema compiler fails to populate.
///
/// Path consumers depend on these exact mappings.
pub const COMPAT_NAMESPACES: &[(&str, &str)] = &[
    ("openflow", "openconfig-openflow"),
    ("oc-log", "openconfig-system-logging"),
    ("oc-proc", "openconfig-procmon"),
    ("oc-sys-term", "openconfig-system-terminal"),
    ("oc-aaa", "openconfig-aaa"),
];

/// Resolves the effective namespace of a schema node.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    /// Prefix → namespace compatibility table
    compat: HashMap<String, String>,
}

impl NamespaceResolver {
    /// Create a resolver seeded with [`COMPAT_NAMESPACES`].
    pub fn new() -> Self {
        Self {
            compat: COMPAT_NAMESPACES
                .iter()
                .map(|(prefix, ns)| (prefix.to_string(), ns.to_string()))
                .collect(),
        }
    }

    /// Create a resolver with the built-in table plus `overrides`.
    ///
    /// An override for a built-in prefix replaces the built-in namespace.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut resolver = Self::new();
        for (prefix, ns) in overrides {
            resolver.add_prefix(prefix, ns);
        }
        resolver
    }

    /// Map a prefix to a namespace.
    pub fn add_prefix(&mut self, prefix: &str, namespace: &str) {
        self.compat
            .insert(prefix.to_string(), namespace.to_string());
    }

    /// Namespace mapped to `prefix` in the compatibility table.
    pub fn compat_namespace(&self, prefix: &str) -> Option<&str> {
        self.compat.get(prefix).map(String::as_str)
    }

    /// Effective namespace of `node` whose parent resolved to `parent_ns`.
    pub fn resolve<'a>(&'a self, node: &'a SchemaNode, parent_ns: &'a str) -> &'a str {
        if let Some(ns) = node.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return ns;
        }

        if let Some(ns) = node
            .prefix
            .as_deref()
            .and_then(|prefix| self.compat_namespace(prefix))
        {
            return ns;
        }

        if let Some(ns) = node
            .namespace_annotation
            .as_deref()
            .and_then(|schema_path| schema_path.split('/').nth(1))
        {
            return ns;
        }

        parent_ns
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}
