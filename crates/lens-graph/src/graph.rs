//! Graph types produced by the tree parser
//!
//! A [`Graph`] owns its nodes and edges and is immutable once built.
//! Node identity is `(depth, name)`, so two entries with the same name at the
//! same depth collapse into a single node. That collision is a known
//! limitation of the identifier scheme and is kept as is.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier derived from `(depth, name)`
///
/// Only unique within a single parse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Derive the identifier for an entry
    #[inline]
    #[must_use]
    pub fn derive(depth: usize, name: &str) -> Self {
        Self(format!("{depth}_{name}"))
    }

    /// Identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Line without any path separator
    Dir,
    /// Line with a path separator, including `name/` directory entries
    File,
}

impl NodeKind {
    /// Display color used by rendered documents
    #[inline]
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            NodeKind::Dir => "#4ECDC4",
            NodeKind::File => "#FF6B6B",
        }
    }
}

/// One entry of the tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Identifier, `{depth}_{name}`
    pub id: NodeId,
    /// Entry name without trailing separator
    pub name: String,
    /// Indentation depth (leading whitespace / indent width)
    pub depth: usize,
    /// Directory or file
    pub kind: NodeKind,
}

/// Parent to child connection between consecutive depths
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Node at depth `d - 1`
    pub parent: NodeId,
    /// Node at depth `d`
    pub child: NodeId,
}

/// Immutable node/edge graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: IndexMap<NodeId, TreeNode>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Assemble a graph from parsed parts
    pub(crate) fn from_parts(nodes: IndexMap<NodeId, TreeNode>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Empty graph
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Nodes in first-seen order
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// Edges in discovery order
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Position of a node in first-seen order
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Number of distinct nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that never appear as an edge child
    ///
    /// Depth-0 entries and deeper entries whose parent line was missing.
    pub fn roots(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes
            .values()
            .filter(|n| !self.edges.iter().any(|e| e.child == n.id))
    }

    /// Direct children of a node in edge order
    pub fn children<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a TreeNode> + 'a {
        self.edges
            .iter()
            .filter(move |e| &e.parent == id)
            .filter_map(|e| self.nodes.get(&e.child))
    }

    /// Deepest node depth, `None` for an empty graph
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.nodes.values().map(|n| n.depth).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(depth: usize, name: &str, kind: NodeKind) -> TreeNode {
        TreeNode {
            id: NodeId::derive(depth, name),
            name: name.to_string(),
            depth,
            kind,
        }
    }

    #[test]
    fn node_id_format() {
        assert_eq!(NodeId::derive(2, "main.rs").as_str(), "2_main.rs");
        assert_eq!(NodeId::derive(0, "repo").to_string(), "0_repo");
    }

    #[test]
    fn roots_and_children() {
        let root = node(0, "repo", NodeKind::Dir);
        let child = node(1, "src", NodeKind::Dir);
        let mut nodes = IndexMap::new();
        nodes.insert(root.id.clone(), root.clone());
        nodes.insert(child.id.clone(), child.clone());
        let edges = vec![Edge {
            parent: root.id.clone(),
            child: child.id.clone(),
        }];
        let graph = Graph::from_parts(nodes, edges);

        let roots: Vec<_> = graph.roots().map(|n| n.name.as_str()).collect();
        assert_eq!(roots, vec!["repo"]);

        let children: Vec<_> = graph.children(&root.id).map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["src"]);
        assert_eq!(graph.max_depth(), Some(1));
    }

    #[test]
    fn empty_graph() {
        let graph = Graph::empty();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.max_depth(), None);
    }

    #[test]
    fn kind_colors_differ() {
        assert_ne!(NodeKind::Dir.color(), NodeKind::File.color());
    }
}
