//! Typed alias tree.
//!
//! Keys are alias or index names. A node is either a nested alias (whose
//! children are bound to it when indices are created) or a leaf index
//! pointing at its mapping file.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

/// A node of the alias tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasNode {
    /// A nested alias with its own children.
    Alias(AliasTree),
    /// A concrete index and the path of its mapping file.
    Index(PathBuf),
}

impl AliasNode {
    /// Returns the subtree if this node is an alias.
    pub fn as_alias(&self) -> Option<&AliasTree> {
        match self {
            AliasNode::Alias(tree) => Some(tree),
            AliasNode::Index(_) => None,
        }
    }

    /// Returns the mapping path if this node is an index.
    pub fn as_index(&self) -> Option<&Path> {
        match self {
            AliasNode::Alias(_) => None,
            AliasNode::Index(path) => Some(path),
        }
    }
}

/// Ordered mapping from alias/index names to nodes.
///
/// Keys iterate in sorted order, so every walk is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTree {
    nodes: BTreeMap<String, AliasNode>,
}

impl AliasTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node stored under `name`.
    pub fn get(&self, name: &str) -> Option<&AliasNode> {
        self.nodes.get(name)
    }

    /// Returns true if `name` is a key of this level.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Inserts a node, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, node: AliasNode) -> Option<AliasNode> {
        self.nodes.insert(name.into(), node)
    }

    /// Removes and returns the node stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<AliasNode> {
        self.nodes.remove(name)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if this level has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the direct children in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AliasNode> {
        self.nodes.iter()
    }

    /// Returns the names of all leaf indices below this level, depth first.
    pub fn indices(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<btree_map::Iter<'_, String, AliasNode>> = vec![self.nodes.iter()];
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some((name, AliasNode::Index(_))) => out.push(name.as_str()),
                Some((_, AliasNode::Alias(sub))) => stack.push(sub.nodes.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    /// Returns a copy restricted to the given top-level names.
    ///
    /// `None` keeps everything.
    pub fn filtered(&self, allow: Option<&[String]>) -> AliasTree {
        match allow {
            None => self.clone(),
            Some(allow) => AliasTree {
                nodes: self
                    .nodes
                    .iter()
                    .filter(|(name, _)| allow.iter().any(|a| a == *name))
                    .map(|(name, node)| (name.clone(), node.clone()))
                    .collect(),
            },
        }
    }
}

impl<'a> IntoIterator for &'a AliasTree {
    type Item = (&'a String, &'a AliasNode);
    type IntoIter = btree_map::Iter<'a, String, AliasNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl FromIterator<(String, AliasNode)> for AliasTree {
    fn from_iter<I: IntoIterator<Item = (String, AliasNode)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
