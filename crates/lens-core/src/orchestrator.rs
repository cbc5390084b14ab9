//! Artifact orchestrator
//!
//! Fans out to independent producers and aggregates their results:
//! - each producer runs as its own task, so a failure, timeout or panic in
//!   one never touches another
//! - producer failures are absorbed into that producer's fallback
//! - one overall deadline bounds the whole run; missing it fails the run
//!   and aborts every pending producer

use crate::collaborators::{Generator, RepositoryHost};
use crate::config::LensConfig;
use crate::error::{CollaboratorError, QueryError};
use crate::producers::{
    ArtifactProducer, CreativeIdeaProducer, DiagramProducer, InstallGuideProducer,
    IssueCategorizationProducer, MetricsProducer, OverviewProducer, ProducerInput,
    SummaryProducer,
};
use crate::types::{ArtifactResult, Slot, ViewModel};
use lens_diagram::DiagramCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Runs producers concurrently under one deadline
#[derive(Clone)]
pub struct ArtifactOrchestrator {
    producers: Vec<Arc<dyn ArtifactProducer>>,
    deadline: Duration,
    producer_timeout: Option<Duration>,
}

impl std::fmt::Debug for ArtifactOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactOrchestrator")
            .field("slots", &self.slots())
            .field("deadline", &self.deadline)
            .field("producer_timeout", &self.producer_timeout)
            .finish()
    }
}

impl ArtifactOrchestrator {
    /// Create orchestrator without producers
    #[must_use]
    pub fn new(config: &LensConfig) -> Self {
        Self {
            producers: Vec::new(),
            deadline: config.deadline(),
            producer_timeout: config.producer_timeout(),
        }
    }

    /// Orchestrator with the standard producer for every slot
    #[must_use]
    pub fn with_default_producers(
        config: &LensConfig,
        generator: Arc<dyn Generator>,
        host: Arc<dyn RepositoryHost>,
        cache: Arc<DiagramCache>,
    ) -> Self {
        Self::new(config)
            .with_producer(SummaryProducer::new(Arc::clone(&generator)))
            .with_producer(InstallGuideProducer::new(
                Arc::clone(&host),
                Arc::clone(&generator),
            ))
            .with_producer(DiagramProducer::new(cache))
            .with_producer(MetricsProducer::new(host))
            .with_producer(IssueCategorizationProducer::new(
                Arc::clone(&generator),
                config.issue_context_chars,
            ))
            .with_producer(CreativeIdeaProducer::new(
                Arc::clone(&generator),
                config.idea_context_chars,
            ))
            .with_producer(OverviewProducer::new(generator))
    }

    /// Add a producer, replacing any existing one for the same slot
    #[must_use]
    pub fn with_producer(mut self, producer: impl ArtifactProducer + 'static) -> Self {
        let producer: Arc<dyn ArtifactProducer> = Arc::new(producer);
        self.producers.retain(|p| p.slot() != producer.slot());
        self.producers.push(producer);
        self
    }

    /// Slots this orchestrator fills
    #[must_use]
    pub fn slots(&self) -> Vec<Slot> {
        self.producers.iter().map(|p| p.slot()).collect()
    }

    /// Configured overall deadline
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run all producers under the configured deadline
    ///
    /// # Errors
    /// Returns `QueryError::DeadlineExceeded` if the producers do not all
    /// finish in time; partial results are discarded.
    pub async fn run(&self, input: ProducerInput) -> Result<ViewModel, QueryError> {
        self.run_until(input, deadline_after(self.deadline)).await
    }

    /// Run all producers, failing at `deadline`
    ///
    /// # Errors
    /// Returns `QueryError::DeadlineExceeded` when `deadline` passes first.
    pub async fn run_until(
        &self,
        input: ProducerInput,
        deadline: Instant,
    ) -> Result<ViewModel, QueryError> {
        let input = Arc::new(input);
        let mut tasks = JoinSet::new();
        for producer in &self.producers {
            let producer = Arc::clone(producer);
            let input = Arc::clone(&input);
            let limit = self.producer_timeout;
            tasks.spawn(async move { run_isolated(producer.as_ref(), &input, limit).await });
        }

        let collect = async {
            let mut view = ViewModel::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => view.insert(result),
                    Err(err) => tracing::error!(error = %err, "producer task aborted"),
                }
            }
            view
        };

        let Ok(mut view) = tokio::time::timeout_at(deadline, collect).await else {
            tracing::warn!(
                repo = %input.repo,
                deadline = ?self.deadline,
                "deadline exceeded, discarding partial artifacts"
            );
            return Err(QueryError::DeadlineExceeded(self.deadline));
        };

        // A panicked producer leaves its slot empty
        for producer in &self.producers {
            if !view.contains(producer.slot()) {
                tracing::warn!(slot = %producer.slot(), "producer panicked, using fallback");
                view.insert(producer.fallback(&input));
            }
        }
        Ok(view)
    }
}

/// Cap for deadlines too far out to represent
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Instant `limit` from now, saturating at a far-future instant
pub(crate) fn deadline_after(limit: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(limit).unwrap_or(now + FAR_FUTURE)
}

async fn run_isolated(
    producer: &dyn ArtifactProducer,
    input: &ProducerInput,
    limit: Option<Duration>,
) -> ArtifactResult {
    let slot = producer.slot();
    let outcome = match limit {
        Some(limit) => tokio::time::timeout(limit, producer.produce(input))
            .await
            .unwrap_or(Err(CollaboratorError::Timeout(limit))),
        None => producer.produce(input).await,
    };
    match outcome {
        Ok(result) => {
            if result.is_fallback() {
                tracing::warn!(slot = %slot, "producer degraded");
            } else {
                tracing::debug!(slot = %slot, "producer finished");
            }
            result
        }
        Err(err) => {
            tracing::warn!(slot = %slot, kind = err.kind(), error = %err, "producer fell back");
            producer.fallback(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactPayload, ArtifactStatus};
    use async_trait::async_trait;

    struct Fixed {
        slot: Slot,
        delay: Duration,
        outcome: Result<(), CollaboratorError>,
        panic: bool,
    }

    impl Fixed {
        fn ok(slot: Slot) -> Self {
            Self {
                slot,
                delay: Duration::ZERO,
                outcome: Ok(()),
                panic: false,
            }
        }

        fn failing(slot: Slot) -> Self {
            Self {
                outcome: Err(CollaboratorError::network("down")),
                ..Self::ok(slot)
            }
        }

        fn slow(slot: Slot, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok(slot)
            }
        }

        fn panicking(slot: Slot) -> Self {
            Self {
                panic: true,
                ..Self::ok(slot)
            }
        }
    }

    #[async_trait]
    impl ArtifactProducer for Fixed {
        fn slot(&self) -> Slot {
            self.slot
        }

        async fn produce(&self, _input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
            tokio::time::sleep(self.delay).await;
            assert!(!self.panic, "producer blew up");
            self.outcome.clone()?;
            Ok(ArtifactResult::ok(self.slot, ArtifactPayload::Idea("ok".into())))
        }

        fn fallback(&self, _input: &ProducerInput) -> ArtifactResult {
            ArtifactResult::fallback(self.slot, ArtifactPayload::Idea("fallback".into()))
        }
    }

    fn config() -> LensConfig {
        LensConfig::new().with_deadline_secs(5)
    }

    #[tokio::test]
    async fn failure_is_isolated() {
        let orchestrator = ArtifactOrchestrator::new(&config())
            .with_producer(Fixed::failing(Slot::Summary))
            .with_producer(Fixed::ok(Slot::CreativeIdea))
            .with_producer(Fixed::ok(Slot::Overview));

        let view = orchestrator.run(ProducerInput::default()).await.unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.fallbacks(), vec![Slot::Summary]);
        assert_eq!(
            view.get(Slot::Overview).unwrap().status,
            ArtifactStatus::Ok
        );
    }

    #[tokio::test]
    async fn panic_is_isolated() {
        let orchestrator = ArtifactOrchestrator::new(&config())
            .with_producer(Fixed::panicking(Slot::Diagram))
            .with_producer(Fixed::ok(Slot::Metrics));

        let view = orchestrator.run(ProducerInput::default()).await.unwrap();
        assert!(view.get(Slot::Diagram).unwrap().is_fallback());
        assert!(!view.get(Slot::Metrics).unwrap().is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn producer_timeout_falls_back() {
        let orchestrator = ArtifactOrchestrator::new(&config().with_producer_timeout_secs(1))
            .with_producer(Fixed::slow(Slot::Summary, Duration::from_secs(3)))
            .with_producer(Fixed::ok(Slot::Metrics));

        let view = orchestrator.run(ProducerInput::default()).await.unwrap();
        assert_eq!(view.fallbacks(), vec![Slot::Summary]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fails_whole_run() {
        let orchestrator = ArtifactOrchestrator::new(&config())
            .with_producer(Fixed::slow(Slot::Summary, Duration::from_secs(60)))
            .with_producer(Fixed::ok(Slot::Metrics));

        let err = orchestrator.run(ProducerInput::default()).await.unwrap_err();
        assert_eq!(err, QueryError::DeadlineExceeded(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn unrepresentable_deadline_saturates() {
        let config = LensConfig::from_toml_str("deadline_secs = 9223372036854775807").unwrap();
        let orchestrator =
            ArtifactOrchestrator::new(&config).with_producer(Fixed::ok(Slot::Metrics));

        let view = orchestrator.run(ProducerInput::default()).await.unwrap();
        assert_eq!(view.len(), 1);
        assert!(deadline_after(Duration::MAX) > Instant::now());
    }

    #[test]
    fn later_producer_replaces_slot() {
        let orchestrator = ArtifactOrchestrator::new(&config())
            .with_producer(Fixed::ok(Slot::Summary))
            .with_producer(Fixed::failing(Slot::Summary));
        assert_eq!(orchestrator.slots(), vec![Slot::Summary]);
    }
}
