//! Artifact producers
//!
//! Each producer fills one [`Slot`]. `produce` may fail with any
//! [`CollaboratorError`]; the orchestrator then substitutes `fallback`, so
//! a producer never has to handle its own failures beyond classifying them.

use crate::error::CollaboratorError;
use crate::types::{ArtifactResult, Issue, RepoMetadata, RepoRef, Slot};
use async_trait::async_trait;

mod diagram;
mod idea;
mod install;
mod issues;
mod metrics;
mod overview;
mod summary;

pub use diagram::DiagramProducer;
pub use idea::{CreativeIdeaProducer, IDEA_FALLBACK};
pub use install::{generic_install_guide, InstallGuideProducer};
pub use issues::{resolve_selection, IssueCategorizationProducer, MAX_ISSUES_PER_BUCKET};
pub use metrics::{project_metrics, MetricsProducer, NO_LICENSE, UNKNOWN_LANGUAGE};
pub use overview::{clean_mermaid, fallback_mermaid, OverviewProducer};
pub use summary::{SummaryProducer, SUMMARY_FALLBACK};

/// Inputs shared by all producers of one query
#[derive(Debug, Clone, Default)]
pub struct ProducerInput {
    /// Repository
    pub repo: RepoRef,
    /// Tree text
    pub tree: String,
    /// File content, possibly cropped
    pub content: String,
    /// Host metadata, defaults when unavailable
    pub metadata: RepoMetadata,
    /// Open issues, empty when unavailable
    pub issues: Vec<Issue>,
}

/// One independent unit of artifact work
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    /// Slot this producer fills
    fn slot(&self) -> Slot;

    /// Produce the artifact
    ///
    /// # Errors
    /// Any collaborator failure; absorbed by the caller.
    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError>;

    /// Documented fallback for this slot
    fn fallback(&self, input: &ProducerInput) -> ArtifactResult;
}

/// Reject blank generator replies
pub(crate) fn non_empty(reply: String) -> Result<String, CollaboratorError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        Err(CollaboratorError::EmptyResponse)
    } else if trimmed.len() == reply.len() {
        Ok(reply)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_replies_are_empty_responses() {
        assert_eq!(non_empty("  \n".into()), Err(CollaboratorError::EmptyResponse));
        assert_eq!(non_empty(" ok \n".into()).unwrap(), "ok");
    }
}
