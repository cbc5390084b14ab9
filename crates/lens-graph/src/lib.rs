//! RepoLens Graph
//!
//! Parses the indentation-formatted file tree produced by repository
//! ingestion into an immutable node/edge [`Graph`].
//!
//! # Example
//!
//! ```rust
//! use lens_graph::parse_tree;
//!
//! let graph = parse_tree("Directory structure:\n└── repo/\n    └── src/");
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod graph;

pub use builder::{parse_tree, TreeGraphBuilder, INDENT_WIDTH, TREE_HEADER};
pub use graph::{Edge, Graph, NodeId, NodeKind, TreeNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
