//! Error types for diagram rendering and storage
//!
//! These never leave [`crate::DiagramCache::render`]; a failed store degrades
//! to [`crate::DiagramHandle::NotCached`].

use std::path::PathBuf;

/// Errors while rendering or persisting a diagram
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// IO error while writing the document
    #[error("io error writing {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Embedded graph data could not be serialized
    #[error("graph serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DiagramError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = DiagramError::io_error(
            "/tmp/x_y_diagram.html",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("x_y_diagram.html"));
        assert!(text.contains("denied"));
    }
}
