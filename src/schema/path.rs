//! Path rendering and normalization.
//!
//! Rendered paths follow the gNMI string form used across the system:
//! `/ns:container/list[key=*]/leaf`, where a segment is namespace-qualified
//! only when its namespace differs from its parent's.

use once_cell::sync::Lazy;
use regex::Regex;

use super::namespace::NamespaceResolver;
use super::SchemaNode;

static KEY_VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"=.*?\]").unwrap());

/// Replace every list-key value in `path` with `*`.
///
/// `/interfaces/interface[name=eth0]/state` becomes
/// `/interfaces/interface[name=*]/state`. Idempotent; anything that is not a
/// key predicate passes through unchanged.
pub fn normalize(path: &str) -> String {
    KEY_VALUE_PATTERN.replace_all(path, "=*]").into_owned()
}

/// Renders absolute schema paths for nodes.
#[derive(Debug, Clone, Copy)]
pub struct PathFormatter<'a> {
    resolver: &'a NamespaceResolver,
}

impl<'a> PathFormatter<'a> {
    pub fn new(resolver: &'a NamespaceResolver) -> Self {
        Self { resolver }
    }

    /// Absolute path of `node` below `parent_path`.
    ///
    /// With `list_form` the segment carries a wildcard key predicate,
    /// `name[key=*]`. The node must then have a non-empty `list_key`;
    /// [`SchemaWalker`](super::SchemaWalker) rejects lists without one before
    /// formatting them.
    pub fn format(
        &self,
        node: &SchemaNode,
        list_form: bool,
        parent_ns: &str,
        parent_path: &str,
    ) -> String {
        let ns = self.resolver.resolve(node, parent_ns);

        if list_form {
            let key = node.list_key.as_deref().unwrap_or_default();
            debug_assert!(!key.is_empty(), "list form of {} requires a list key", node.name);
            if ns == parent_ns {
                format!("{}/{}[{}=*]", parent_path, node.name, key)
            } else {
                format!("{}/{}:{}[{}=*]", parent_path, ns, node.name, key)
            }
        } else if ns == parent_ns || ns.is_empty() {
            format!("{}/{}", parent_path, node.name)
        } else {
            format!("{}/{}:{}", parent_path, ns, node.name)
        }
    }
}
