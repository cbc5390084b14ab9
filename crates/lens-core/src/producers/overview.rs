use super::{ArtifactProducer, ProducerInput};
use crate::collaborators::Generator;
use crate::error::CollaboratorError;
use crate::prompts;
use crate::types::{ArtifactPayload, ArtifactResult, Slot};
use async_trait::async_trait;
use std::sync::Arc;

const MERMAID_HEADER: &str = "graph TD";

/// Strip code fences and ensure the `graph TD` header
#[must_use]
pub fn clean_mermaid(raw: &str) -> String {
    let body = raw.replace("```mermaid", "").replace("```", "");
    let body = body.trim();
    if body.starts_with(MERMAID_HEADER) {
        body.to_string()
    } else {
        format!("{MERMAID_HEADER}\n{body}")
    }
}

/// Fixed diagram reporting that generation failed
#[must_use]
pub fn fallback_mermaid(label: &str) -> String {
    format!(
        "{MERMAID_HEADER}\n    A[{label} Diagram] --> B[Diagram generation failed]\n    B --> C[Please try again]\n    \
style A fill:#f9f,stroke:#333,stroke-width:4px\n    \
style B fill:#ff9,stroke:#333,stroke-width:2px\n    \
style C fill:#9f9,stroke:#333,stroke-width:2px"
    )
}

/// Mermaid architecture sketch
pub struct OverviewProducer {
    generator: Arc<dyn Generator>,
}

impl OverviewProducer {
    /// Create producer
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ArtifactProducer for OverviewProducer {
    fn slot(&self) -> Slot {
        Slot::Overview
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let raw = self.generator.generate(&prompts::overview(&input.tree)).await?;
        if raw.replace("```mermaid", "").replace("```", "").trim().is_empty() {
            return Err(CollaboratorError::EmptyResponse);
        }
        Ok(ArtifactResult::ok(
            Slot::Overview,
            ArtifactPayload::Overview(clean_mermaid(&raw)),
        ))
    }

    fn fallback(&self, _input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::Overview,
            ArtifactPayload::Overview(fallback_mermaid("Overview")),
        )
    }
}
