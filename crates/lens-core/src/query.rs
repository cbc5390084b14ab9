//! End-to-end query processing
//!
//! Ingest, fetch host data, crop content and run the orchestrator, all under
//! one deadline. Only a deadline breach, an ingestion failure or an invalid
//! source fail the query.

use crate::collaborators::{Generator, Ingestor, RepositoryHost};
use crate::config::LensConfig;
use crate::error::QueryError;
use crate::orchestrator::{deadline_after, ArtifactOrchestrator};
use crate::producers::ProducerInput;
use crate::prompts::excerpt;
use crate::types::{RepoMetadata, RepoRef, ViewModel};
use lens_diagram::DiagramCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Crop `content` to `max_chars` characters with a leading notice
#[must_use]
pub fn crop_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    format!(
        "(Files content cropped to {}k characters, download full ingest to see more)\n{}",
        max_chars / 1_000,
        excerpt(content, max_chars)
    )
}

/// Everything shown for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReport {
    /// Repository
    pub repo: RepoRef,
    /// Ingestion summary
    pub summary: String,
    /// Tree text
    pub tree: String,
    /// Content, possibly cropped
    pub content: String,
    /// Host metadata
    pub metadata: RepoMetadata,
    /// Artifacts per slot
    pub view: ViewModel,
}

/// Query pipeline
#[derive(Clone)]
pub struct QueryProcessor {
    ingestor: Arc<dyn Ingestor>,
    host: Arc<dyn RepositoryHost>,
    orchestrator: ArtifactOrchestrator,
    config: LensConfig,
}

impl std::fmt::Debug for QueryProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryProcessor")
            .field("orchestrator", &self.orchestrator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryProcessor {
    /// Create processor with the standard producers
    #[must_use]
    pub fn new(
        config: LensConfig,
        ingestor: Arc<dyn Ingestor>,
        host: Arc<dyn RepositoryHost>,
        generator: Arc<dyn Generator>,
        cache: Arc<DiagramCache>,
    ) -> Self {
        let orchestrator = ArtifactOrchestrator::with_default_producers(
            &config,
            generator,
            Arc::clone(&host),
            cache,
        );
        Self {
            ingestor,
            host,
            orchestrator,
            config,
        }
    }

    /// Replace the orchestrator
    #[must_use]
    pub fn with_orchestrator(mut self, orchestrator: ArtifactOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    /// Process one repository source
    ///
    /// # Errors
    /// - `QueryError::InvalidSource` if `source` names no repository
    /// - `QueryError::RepositoryNotFound` / `QueryError::Ingestion` if
    ///   ingestion fails
    /// - `QueryError::DeadlineExceeded` if anything is still pending at the
    ///   deadline
    pub async fn process(&self, source: &str) -> Result<QueryReport, QueryError> {
        let repo = RepoRef::parse(source)?;
        let deadline = deadline_after(self.config.deadline());
        tracing::info!(owner = %repo.owner, repo = %repo.repo, "processing query");

        let upstream = async {
            let (ingested, metadata, issues) = futures::future::join3(
                self.ingestor.ingest(source),
                self.host.metadata(&repo),
                self.host.issues(&repo),
            )
            .await;
            (ingested, metadata, issues)
        };
        let Ok((ingested, metadata, issues)) = tokio::time::timeout_at(deadline, upstream).await
        else {
            tracing::warn!(repo = %repo, "deadline exceeded during ingestion");
            return Err(QueryError::DeadlineExceeded(self.config.deadline()));
        };

        let ingested = ingested.map_err(|err| {
            tracing::warn!(repo = %repo, error = %err, "ingestion failed");
            QueryError::from_ingest(source, err)
        })?;
        let metadata = metadata.unwrap_or_else(|err| {
            tracing::warn!(repo = %repo, error = %err, "metadata unavailable");
            RepoMetadata::default()
        });
        let issues = issues.unwrap_or_else(|err| {
            tracing::warn!(repo = %repo, error = %err, "issues unavailable");
            Vec::new()
        });

        let content = crop_content(&ingested.content, self.config.max_display_chars);
        let input = ProducerInput {
            repo: repo.clone(),
            tree: ingested.tree.clone(),
            content: content.clone(),
            metadata: metadata.clone(),
            issues,
        };
        let view = self.orchestrator.run_until(input, deadline).await?;

        tracing::info!(
            repo = %repo,
            fallbacks = view.fallbacks().len(),
            "query finished"
        );
        Ok(QueryReport {
            repo,
            summary: ingested.summary,
            tree: ingested.tree,
            content,
            metadata,
            view,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockGenerator, MockIngestor, MockRepositoryHost};
    use crate::error::{CollaboratorError, IngestError};

    #[test]
    fn short_content_untouched() {
        assert_eq!(crop_content("abc", 10), "abc");
    }

    #[test]
    fn long_content_cropped_with_notice() {
        let content = "x".repeat(3_500);
        let cropped = crop_content(&content, 2_000);
        assert!(cropped.starts_with(
            "(Files content cropped to 2k characters, download full ingest to see more)\n"
        ));
        assert_eq!(cropped.lines().nth(1).unwrap().len(), 2_000);
    }

    fn processor(ingestor: MockIngestor, host: MockRepositoryHost, dir: &std::path::Path) -> QueryProcessor {
        QueryProcessor::new(
            LensConfig::new(),
            Arc::new(ingestor),
            Arc::new(host),
            Arc::new(MockGenerator::new()),
            Arc::new(DiagramCache::new(dir)),
        )
    }

    #[tokio::test]
    async fn invalid_source_fails_before_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let mut ingestor = MockIngestor::new();
        ingestor.expect_ingest().never();
        let err = processor(ingestor, MockRepositoryHost::new(), dir.path())
            .process("not-a-repo")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidSource(_)));
    }

    #[tokio::test]
    async fn missing_repository_is_user_visible() {
        let dir = tempfile::tempdir().unwrap();
        let mut ingestor = MockIngestor::new();
        ingestor.expect_ingest().returning(|_| Err(IngestError::NotFound));
        let mut host = MockRepositoryHost::new();
        host.expect_metadata()
            .returning(|_| Err(CollaboratorError::not_found("repo")));
        host.expect_issues().returning(|_| Ok(Vec::new()));

        let err = processor(ingestor, host, dir.path())
            .process("https://github.com/octo/ghost")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::RepositoryNotFound("https://github.com/octo/ghost".into())
        );
    }
}
