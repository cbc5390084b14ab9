use super::{non_empty, ArtifactProducer, ProducerInput};
use crate::collaborators::{Generator, RepositoryHost};
use crate::error::CollaboratorError;
use crate::prompts;
use crate::types::{ArtifactPayload, ArtifactResult, RepoRef, Slot};
use async_trait::async_trait;
use std::sync::Arc;

/// Generic clone-and-enter guide for a repository
#[must_use]
pub fn generic_install_guide(repo: &RepoRef) -> String {
    format!(
        "# No README found\n```bash\n# Generic installation\ngit clone https://github.com/{}/{}.git\ncd {}\n```",
        repo.owner, repo.repo, repo.repo
    )
}

/// Installation steps derived from the README
pub struct InstallGuideProducer {
    host: Arc<dyn RepositoryHost>,
    generator: Arc<dyn Generator>,
}

impl InstallGuideProducer {
    /// Create producer
    #[must_use]
    pub fn new(host: Arc<dyn RepositoryHost>, generator: Arc<dyn Generator>) -> Self {
        Self { host, generator }
    }
}

#[async_trait]
impl ArtifactProducer for InstallGuideProducer {
    fn slot(&self) -> Slot {
        Slot::InstallGuide
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let readme = self.host.readme(&input.repo).await?;
        if readme.trim().is_empty() {
            return Err(CollaboratorError::not_found("README"));
        }
        let guide = non_empty(self.generator.generate(&prompts::install_guide(&readme)).await?)?;
        Ok(ArtifactResult::ok(
            Slot::InstallGuide,
            ArtifactPayload::InstallGuide(guide),
        ))
    }

    fn fallback(&self, input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::InstallGuide,
            ArtifactPayload::InstallGuide(generic_install_guide(&input.repo)),
        )
    }
}
