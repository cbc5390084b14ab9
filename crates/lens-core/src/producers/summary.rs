use super::{ArtifactProducer, ProducerInput};
use crate::collaborators::Generator;
use crate::error::CollaboratorError;
use crate::prompts;
use crate::types::{ArtifactPayload, ArtifactResult, ProjectDescription, Slot};
use async_trait::async_trait;
use lens_structured::{try_extract, Shape};
use std::sync::Arc;

/// Summary text used when analysis fails
pub const SUMMARY_FALLBACK: &str = "Repository analysis is unavailable right now.";

/// Structured repository description
pub struct SummaryProducer {
    generator: Arc<dyn Generator>,
    schema: serde_json::Value,
}

impl SummaryProducer {
    /// Create producer
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(ProjectDescription))
            .unwrap_or(serde_json::Value::Null);
        Self { generator, schema }
    }
}

#[async_trait]
impl ArtifactProducer for SummaryProducer {
    fn slot(&self) -> Slot {
        Slot::Summary
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let prompt = prompts::summary(&input.tree, &input.content);
        let raw = self.generator.generate_structured(&prompt, &self.schema).await?;
        if raw.trim().is_empty() {
            return Err(CollaboratorError::EmptyResponse);
        }
        // Object shape also unwraps a `[{..}]` reply
        let description: ProjectDescription = try_extract(&raw, Shape::Object)?;
        Ok(ArtifactResult::ok(
            Slot::Summary,
            ArtifactPayload::Summary(description),
        ))
    }

    fn fallback(&self, _input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::Summary,
            ArtifactPayload::Summary(ProjectDescription {
                summary: SUMMARY_FALLBACK.to_string(),
                use_cases: Vec::new(),
                contribution_insights: Vec::new(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockGenerator;

    fn producer(reply: Result<String, CollaboratorError>) -> SummaryProducer {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate_structured()
            .withf(|prompt, schema| {
                prompt.starts_with("Analyze this repository.") && schema.get("properties").is_some()
            })
            .times(1)
            .returning(move |_, _| reply.clone());
        SummaryProducer::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn parses_array_wrapped_description() {
        let raw = r#"[{"summary": "A CLI", "use_cases": ["a", "b"], "contribution_insights": ["c"]}]"#;
        let result = producer(Ok(raw.into()))
            .produce(&ProducerInput::default())
            .await
            .unwrap();
        assert!(!result.is_fallback());
        match result.payload {
            ArtifactPayload::Summary(desc) => {
                assert_eq!(desc.summary, "A CLI");
                assert_eq!(desc.use_cases.len(), 2);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let err = producer(Ok("I cannot help with that".into()))
            .produce(&ProducerInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn blank_reply_is_empty_response() {
        let err = producer(Ok("   ".into()))
            .produce(&ProducerInput::default())
            .await
            .unwrap_err();
        assert_eq!(err, CollaboratorError::EmptyResponse);
    }

    #[test]
    fn fallback_has_fixed_summary_and_empty_lists() {
        let result = SummaryProducer::new(Arc::new(MockGenerator::new()))
            .fallback(&ProducerInput::default());
        assert!(result.is_fallback());
        assert_eq!(
            result.payload,
            ArtifactPayload::Summary(ProjectDescription {
                summary: SUMMARY_FALLBACK.into(),
                ..ProjectDescription::default()
            })
        );
    }
}
