//! RepoLens Diagram
//!
//! Renders a repository tree [`lens_graph::Graph`] into a self-contained HTML
//! document and stores it under a deterministic per-repository file name.
//!
//! ## Key Components
//!
//! - [`DiagramCache`]: repository-keyed render-or-reuse with atomic writes
//! - [`layout`]: fixed-parameter force-directed placement
//! - [`render_html`]: document with inline SVG and embedded graph data

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod document;
pub mod error;
pub mod layout;

pub use cache::{
    CacheStats, DiagramArtifact, DiagramCache, DiagramHandle, DiagramKey, DIAGRAM_EXTENSION,
};
pub use document::render_html;
pub use error::DiagramError;
pub use layout::{layout, PhysicsParams, Position};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
