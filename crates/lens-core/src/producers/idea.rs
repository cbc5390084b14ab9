use super::{non_empty, ArtifactProducer, ProducerInput};
use crate::collaborators::Generator;
use crate::error::CollaboratorError;
use crate::prompts;
use crate::types::{ArtifactPayload, ArtifactResult, Slot};
use async_trait::async_trait;
use std::sync::Arc;

/// Idea text used when generation fails
pub const IDEA_FALLBACK: &str = "No feature idea could be generated for this repository.";

/// One creative feature suggestion
pub struct CreativeIdeaProducer {
    generator: Arc<dyn Generator>,
    context_chars: usize,
}

impl CreativeIdeaProducer {
    /// Create producer with the content excerpt length used in prompts
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, context_chars: usize) -> Self {
        Self {
            generator,
            context_chars,
        }
    }
}

#[async_trait]
impl ArtifactProducer for CreativeIdeaProducer {
    fn slot(&self) -> Slot {
        Slot::CreativeIdea
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let prompt = prompts::creative_idea(
            &input.repo,
            prompts::excerpt(&input.content, self.context_chars),
        );
        let idea = non_empty(self.generator.generate(&prompt).await?)?;
        Ok(ArtifactResult::ok(Slot::CreativeIdea, ArtifactPayload::Idea(idea)))
    }

    fn fallback(&self, _input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::CreativeIdea,
            ArtifactPayload::Idea(IDEA_FALLBACK.to_string()),
        )
    }
}
