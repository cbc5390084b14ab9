use super::{ArtifactProducer, ProducerInput};
use crate::collaborators::RepositoryHost;
use crate::error::CollaboratorError;
use crate::types::{ArtifactPayload, ArtifactResult, ProjectMetrics, RepoMetadata, Slot};
use async_trait::async_trait;
use std::sync::Arc;

/// Language shown when the host reports none
pub const UNKNOWN_LANGUAGE: &str = "Unknown";
/// License shown when the host reports none
pub const NO_LICENSE: &str = "No license";

/// Metrics from host metadata plus a contributor count
#[must_use]
pub fn project_metrics(metadata: &RepoMetadata, contributors: u64) -> ProjectMetrics {
    ProjectMetrics {
        stars: metadata.stargazers_count,
        forks: metadata.forks_count,
        open_issues: metadata.open_issues_count,
        watchers: metadata.watchers_count,
        contributors,
        language: metadata
            .language
            .clone()
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        license: metadata
            .license
            .as_ref()
            .and_then(|l| l.name.clone())
            .unwrap_or_else(|| NO_LICENSE.to_string()),
    }
}

/// Repository metrics; never fails
pub struct MetricsProducer {
    host: Arc<dyn RepositoryHost>,
}

impl MetricsProducer {
    /// Create producer
    #[must_use]
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl ArtifactProducer for MetricsProducer {
    fn slot(&self) -> Slot {
        Slot::Metrics
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let contributors = match input.metadata.contributors_url.as_deref() {
            Some(url) if !url.is_empty() => match self.host.contributors_count(url).await {
                Ok(count) => count,
                Err(err) => {
                    tracing::warn!(repo = %input.repo, error = %err, "contributor count unavailable");
                    0
                }
            },
            _ => 0,
        };
        Ok(ArtifactResult::ok(
            Slot::Metrics,
            ArtifactPayload::Metrics(project_metrics(&input.metadata, contributors)),
        ))
    }

    fn fallback(&self, input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::Metrics,
            ArtifactPayload::Metrics(project_metrics(&input.metadata, 0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockRepositoryHost;
    use crate::types::License;
    use pretty_assertions::assert_eq;

    fn metadata() -> RepoMetadata {
        RepoMetadata {
            stargazers_count: 10,
            forks_count: 2,
            open_issues_count: 3,
            watchers_count: 10,
            contributors_url: Some("https://api.github.com/repos/octo/hello/contributors".into()),
            language: Some("Rust".into()),
            license: Some(License {
                name: Some("MIT License".into()),
            }),
            ..RepoMetadata::default()
        }
    }

    #[test]
    fn defaults_for_missing_fields() {
        let metrics = project_metrics(&RepoMetadata::default(), 0);
        assert_eq!(metrics.language, "Unknown");
        assert_eq!(metrics.license, "No license");
        assert_eq!(metrics.stars, 0);
    }

    #[tokio::test]
    async fn counts_contributors() {
        let mut host = MockRepositoryHost::new();
        host.expect_contributors_count()
            .withf(|url| url.ends_with("/contributors"))
            .returning(|_| Ok(4));
        let input = ProducerInput {
            metadata: metadata(),
            ..ProducerInput::default()
        };
        let result = MetricsProducer::new(Arc::new(host)).produce(&input).await.unwrap();
        assert_eq!(
            result.payload,
            ArtifactPayload::Metrics(ProjectMetrics {
                stars: 10,
                forks: 2,
                open_issues: 3,
                watchers: 10,
                contributors: 4,
                language: "Rust".into(),
                license: "MIT License".into(),
            })
        );
    }

    #[tokio::test]
    async fn contributor_failure_counts_zero() {
        let mut host = MockRepositoryHost::new();
        host.expect_contributors_count()
            .returning(|_| Err(CollaboratorError::network("reset")));
        let input = ProducerInput {
            metadata: metadata(),
            ..ProducerInput::default()
        };
        let result = MetricsProducer::new(Arc::new(host)).produce(&input).await.unwrap();
        assert!(!result.is_fallback());
        match result.payload {
            ArtifactPayload::Metrics(m) => assert_eq!(m.contributors, 0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_contributors_url_makes_no_call() {
        let mut host = MockRepositoryHost::new();
        host.expect_contributors_count().never();
        let result = MetricsProducer::new(Arc::new(host))
            .produce(&ProducerInput::default())
            .await
            .unwrap();
        assert!(!result.is_fallback());
    }
}
