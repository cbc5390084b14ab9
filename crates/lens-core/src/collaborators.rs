//! Narrow interfaces to external collaborators
//!
//! Every call is fallible and latency-bearing. Callers absorb failures
//! locally; nothing returned here is surfaced to the user directly.

use crate::error::{CollaboratorError, IngestError};
use crate::types::{IngestedRepository, Issue, RepoMetadata, RepoRef};
use async_trait::async_trait;

/// Text-generation collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Free-form text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;

    /// Text constrained to a JSON schema
    ///
    /// Returns the raw reply; callers extract the payload with
    /// `lens_structured`. Clients without schema support fall back to
    /// plain generation.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, CollaboratorError> {
        let _ = schema;
        self.generate(prompt).await
    }
}

/// Repository hosting service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Repository metadata
    async fn metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, CollaboratorError>;

    /// Decoded README text; `NotFound` when the repository has none
    async fn readme(&self, repo: &RepoRef) -> Result<String, CollaboratorError>;

    /// Open issues
    async fn issues(&self, repo: &RepoRef) -> Result<Vec<Issue>, CollaboratorError>;

    /// Number of entries behind a contributors endpoint
    async fn contributors_count(&self, contributors_url: &str) -> Result<u64, CollaboratorError>;

    /// Repositories matching a search query, best match first
    async fn search(&self, query: &str) -> Result<Vec<RepoMetadata>, CollaboratorError>;
}

/// Repository ingestion collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Ingest a repository into summary, tree text and content
    async fn ingest(&self, source: &str) -> Result<IngestedRepository, IngestError>;
}
