use super::{ArtifactProducer, ProducerInput};
use crate::error::CollaboratorError;
use crate::types::{ArtifactPayload, ArtifactResult, Slot};
use async_trait::async_trait;
use lens_diagram::{DiagramCache, DiagramHandle};
use lens_graph::TreeGraphBuilder;
use std::sync::Arc;

/// Structure diagram rendered through the shared cache
///
/// Makes no generator call. A cache write failure yields a fallback result
/// carrying the `NotCached` handle; an empty tree is a valid result.
pub struct DiagramProducer {
    cache: Arc<DiagramCache>,
    builder: TreeGraphBuilder,
}

impl DiagramProducer {
    /// Create producer
    #[must_use]
    pub fn new(cache: Arc<DiagramCache>) -> Self {
        Self {
            cache,
            builder: TreeGraphBuilder::new(),
        }
    }

    /// With custom tree parsing
    #[must_use]
    pub fn with_builder(mut self, builder: TreeGraphBuilder) -> Self {
        self.builder = builder;
        self
    }
}

#[async_trait]
impl ArtifactProducer for DiagramProducer {
    fn slot(&self) -> Slot {
        Slot::Diagram
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        let graph = self.builder.build(&input.tree);
        let handle = self.cache.render(&input.repo.diagram_key(), &graph).await;
        Ok(if handle.is_not_cached() {
            ArtifactResult::fallback(Slot::Diagram, ArtifactPayload::Diagram(handle))
        } else {
            ArtifactResult::ok(Slot::Diagram, ArtifactPayload::Diagram(handle))
        })
    }

    fn fallback(&self, input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::Diagram,
            ArtifactPayload::Diagram(DiagramHandle::NotCached {
                key: input.repo.diagram_key(),
                reason: "diagram rendering did not complete".to_string(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepoRef;

    fn input(tree: &str) -> ProducerInput {
        ProducerInput {
            repo: RepoRef::new("octo", "hello"),
            tree: tree.to_string(),
            ..ProducerInput::default()
        }
    }

    #[tokio::test]
    async fn renders_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let producer = DiagramProducer::new(Arc::new(DiagramCache::new(dir.path())));
        let result = producer
            .produce(&input("Directory structure:\n└── hello/\n    └── main.rs"))
            .await
            .unwrap();
        assert!(!result.is_fallback());
        assert!(dir.path().join("octo_hello_diagram.html").exists());
    }

    #[tokio::test]
    async fn empty_tree_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let producer = DiagramProducer::new(Arc::new(DiagramCache::new(dir.path())));
        let result = producer.produce(&input("Directory structure:")).await.unwrap();
        assert_eq!(result, ArtifactResult::ok(Slot::Diagram, ArtifactPayload::Diagram(DiagramHandle::Empty)));
    }

    #[tokio::test]
    async fn write_failure_is_fallback_with_handle() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let producer = DiagramProducer::new(Arc::new(DiagramCache::new(&blocker)));

        let result = producer.produce(&input("└── hello/")).await.unwrap();
        assert!(result.is_fallback());
        assert!(matches!(
            result.payload,
            ArtifactPayload::Diagram(DiagramHandle::NotCached { .. })
        ));
    }
}
