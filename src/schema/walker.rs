//! Read-only path extraction.
//!
//! The walker threads the `config` tri-state from ancestor to descendant.
//! A node is read-only when it is declared `config false` or any ancestor
//! is. A read-only container or list is emitted once and its subtree is not
//! enumerated, since every descendant is implicitly read-only.

use std::collections::BTreeSet;

use super::namespace::NamespaceResolver;
use super::path::PathFormatter;
use super::{ConfigState, NodeKind, SchemaError, SchemaNode};

/// Default nesting limit for a schema walk.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Walks schema trees and collects read-only paths.
#[derive(Debug, Clone, Copy)]
pub struct SchemaWalker<'a> {
    resolver: &'a NamespaceResolver,
    max_depth: usize,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(resolver: &'a NamespaceResolver) -> Self {
        Self {
            resolver,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Read-only paths below a model's root entry.
    ///
    /// The root contributes no path segment of its own; its children start
    /// with an unset config state, no namespace and an empty path.
    pub fn read_only_paths(&self, root: &SchemaNode) -> Result<BTreeSet<String>, SchemaError> {
        self.extract_read_only_paths(root, ConfigState::Unset, "", "")
    }

    /// Read-only paths among the descendants of `node`, given the context
    /// inherited from its parent.
    pub fn extract_read_only_paths(
        &self,
        node: &SchemaNode,
        parent_state: ConfigState,
        parent_ns: &str,
        parent_path: &str,
    ) -> Result<BTreeSet<String>, SchemaError> {
        let mut paths = BTreeSet::new();
        self.walk(node, parent_state, parent_ns, parent_path, 1, &mut paths)?;
        Ok(paths)
    }

    fn walk(
        &self,
        node: &SchemaNode,
        parent_state: ConfigState,
        parent_ns: &str,
        parent_path: &str,
        depth: usize,
        paths: &mut BTreeSet<String>,
    ) -> Result<(), SchemaError> {
        let formatter = PathFormatter::new(self.resolver);

        for child in &node.children {
            let namespace = self.resolver.resolve(child, parent_ns);
            let mut path = formatter.format(child, false, parent_ns, parent_path);

            if depth > self.max_depth {
                return Err(SchemaError::DepthExceeded {
                    path,
                    max: self.max_depth,
                });
            }

            let read_only = child.config_state.is_read_only() || parent_state.is_read_only();

            match child.kind {
                NodeKind::Leaf => {
                    if !child.children.is_empty() {
                        return Err(SchemaError::LeafWithChildren { path });
                    }
                    if read_only {
                        paths.insert(path);
                    }
                    continue;
                }
                NodeKind::List => {
                    if child.list_key.as_deref().map_or(true, str::is_empty) {
                        return Err(SchemaError::MissingListKey { path });
                    }
                    path = formatter.format(child, true, parent_ns, parent_path);
                }
                NodeKind::Container => {}
            }

            if read_only {
                paths.insert(path);
                continue;
            }
            self.walk(child, child.config_state, namespace, &path, depth + 1, paths)?;
        }

        Ok(())
    }
}
