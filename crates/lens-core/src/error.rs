//! Error types for RepoLens Core
//!
//! Two layers:
//! - [`CollaboratorError`] for every external call; always absorbed by the
//!   producer or store that made the call
//! - [`QueryError`] for the few failures that replace a whole query result

use std::time::Duration;

/// Failure of an external collaborator call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Transport-level failure
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Call did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Response did not have the expected structure
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Response was empty
    #[error("empty response")]
    EmptyResponse,

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

impl CollaboratorError {
    /// Create network failure
    #[inline]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkFailure(msg.into())
    }

    /// Create malformed response
    #[inline]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create not found
    #[inline]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure(_) | Self::Timeout(_))
    }

    /// Short kind label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "network_failure",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::EmptyResponse => "empty_response",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl From<lens_structured::ExtractError> for CollaboratorError {
    fn from(err: lens_structured::ExtractError) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Ingestion failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Repository does not exist or is not public
    #[error("repository not found")]
    NotFound,

    /// Any other ingestion failure
    #[error("ingestion failed: {0}")]
    Failed(String),
}

/// Query-level failure, shown to the user instead of the artifact bundle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Overall deadline exceeded
    #[error("query exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// Ingestion failed
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Repository missing or private
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// Source is not an `owner/repo` reference
    #[error("invalid repository source: {0:?}")]
    InvalidSource(String),
}

impl QueryError {
    /// The single message displayed in place of the results
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::DeadlineExceeded(_) => {
                "Error: processing took too long, please try again later".to_string()
            }
            Self::Ingestion(msg) => format!("Error: {msg}"),
            Self::RepositoryNotFound(_) => {
                "Repository not found. Please make sure it is public".to_string()
            }
            Self::InvalidSource(source) => {
                format!("Error: {source:?} is not a repository reference of the form owner/repo")
            }
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_) | Self::Ingestion(_))
    }

    /// Build from an ingestion failure for `source`
    #[must_use]
    pub fn from_ingest(source: &str, err: IngestError) -> Self {
        match err {
            IngestError::NotFound => Self::RepositoryNotFound(source.to_string()),
            IngestError::Failed(msg) => Self::Ingestion(msg),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path
        path: std::path::PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML or unknown key
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(CollaboratorError::network("reset").is_retryable());
        assert!(CollaboratorError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!CollaboratorError::EmptyResponse.is_retryable());
        assert!(!CollaboratorError::not_found("README").is_retryable());
        assert_eq!(CollaboratorError::malformed("x").kind(), "malformed_response");
    }

    #[test]
    fn not_found_ingestion_has_fixed_message() {
        let err = QueryError::from_ingest("octo/missing", IngestError::NotFound);
        assert_eq!(
            err.user_message(),
            "Repository not found. Please make sure it is public"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn other_ingestion_failures_carry_cause() {
        let err = QueryError::from_ingest("octo/repo", IngestError::Failed("clone failed".into()));
        assert_eq!(err.user_message(), "Error: clone failed");
    }

    #[test]
    fn extract_error_becomes_malformed() {
        let err = lens_structured::try_extract::<Vec<u32>>("nothing", lens_structured::Shape::Array)
            .unwrap_err();
        let err: CollaboratorError = err.into();
        assert_eq!(err.kind(), "malformed_response");
    }
}
