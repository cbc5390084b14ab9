use super::{ArtifactProducer, ProducerInput};
use crate::collaborators::Generator;
use crate::error::CollaboratorError;
use crate::prompts;
use crate::types::{ArtifactPayload, ArtifactResult, CategorizedIssues, Issue, IssueSelection, Slot};
use async_trait::async_trait;
use lens_structured::{try_extract, Shape};
use std::sync::Arc;

/// Upper bound on issues kept per bucket
pub const MAX_ISSUES_PER_BUCKET: usize = 3;

/// Resolve model-chosen indices against the issue list
///
/// Out-of-range and repeated indices are dropped, and each bucket keeps at
/// most [`MAX_ISSUES_PER_BUCKET`] issues.
#[must_use]
pub fn resolve_selection(selection: &IssueSelection, issues: &[Issue]) -> CategorizedIssues {
    let bucket = |indices: &[i64]| -> Vec<Issue> {
        let mut seen = Vec::with_capacity(MAX_ISSUES_PER_BUCKET);
        for &raw in indices {
            let Ok(idx) = usize::try_from(raw) else {
                continue;
            };
            if idx >= issues.len() || seen.contains(&idx) {
                continue;
            }
            seen.push(idx);
            if seen.len() == MAX_ISSUES_PER_BUCKET {
                break;
            }
        }
        seen.into_iter().map(|idx| issues[idx].clone()).collect()
    };
    CategorizedIssues {
        beginner: bucket(&selection.beginner_issues),
        intermediate: bucket(&selection.intermediate_issues),
        advanced: bucket(&selection.advanced_issues),
    }
}

/// Issues sorted into difficulty buckets
pub struct IssueCategorizationProducer {
    generator: Arc<dyn Generator>,
    context_chars: usize,
    schema: serde_json::Value,
}

impl IssueCategorizationProducer {
    /// Create producer with the content excerpt length used in prompts
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, context_chars: usize) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(IssueSelection))
            .unwrap_or(serde_json::Value::Null);
        Self {
            generator,
            context_chars,
            schema,
        }
    }
}

#[async_trait]
impl ArtifactProducer for IssueCategorizationProducer {
    fn slot(&self) -> Slot {
        Slot::IssueCategorization
    }

    async fn produce(&self, input: &ProducerInput) -> Result<ArtifactResult, CollaboratorError> {
        if input.issues.is_empty() {
            return Ok(ArtifactResult::ok(
                Slot::IssueCategorization,
                ArtifactPayload::Issues(CategorizedIssues::default()),
            ));
        }
        let prompt = prompts::issue_selection(
            &input.repo,
            &input.issues,
            prompts::excerpt(&input.content, self.context_chars),
        );
        let raw = self.generator.generate_structured(&prompt, &self.schema).await?;
        let selection: IssueSelection = try_extract(&raw, Shape::Object)?;
        Ok(ArtifactResult::ok(
            Slot::IssueCategorization,
            ArtifactPayload::Issues(resolve_selection(&selection, &input.issues)),
        ))
    }

    fn fallback(&self, _input: &ProducerInput) -> ArtifactResult {
        ArtifactResult::fallback(
            Slot::IssueCategorization,
            ArtifactPayload::Issues(CategorizedIssues::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockGenerator;

    fn issues(n: u64) -> Vec<Issue> {
        (0..n)
            .map(|number| Issue {
                number,
                title: format!("issue {number}"),
                ..Issue::default()
            })
            .collect()
    }

    fn numbers(list: &[Issue]) -> Vec<u64> {
        list.iter().map(|i| i.number).collect()
    }

    #[test]
    fn selection_is_filtered() {
        let selection = IssueSelection {
            beginner_issues: vec![0, 0, 9, -1, 2],
            intermediate_issues: vec![1, 2, 3, 4],
            advanced_issues: vec![],
        };
        let got = resolve_selection(&selection, &issues(5));
        assert_eq!(numbers(&got.beginner), vec![0, 2]);
        assert_eq!(numbers(&got.intermediate), vec![1, 2, 3]);
        assert!(got.advanced.is_empty());
    }

    #[tokio::test]
    async fn no_issues_no_call() {
        let mut generator = MockGenerator::new();
        generator.expect_generate_structured().never();
        let producer = IssueCategorizationProducer::new(Arc::new(generator), 1_000);

        let result = producer.produce(&ProducerInput::default()).await.unwrap();
        assert!(!result.is_fallback());
        assert_eq!(
            result.payload,
            ArtifactPayload::Issues(CategorizedIssues::default())
        );
    }

    #[tokio::test]
    async fn categorizes_with_cropped_context() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate_structured()
            .withf(|prompt, _| prompt.contains("abcde") && !prompt.contains("abcdef"))
            .returning(|_, _| {
                Ok(r#"{"beginner_issues": [1], "intermediate_issues": [], "advanced_issues": [0]}"#.into())
            });
        let input = ProducerInput {
            content: "abcdefgh".into(),
            issues: issues(2),
            ..ProducerInput::default()
        };
        let result = IssueCategorizationProducer::new(Arc::new(generator), 5)
            .produce(&input)
            .await
            .unwrap();
        match result.payload {
            ArtifactPayload::Issues(got) => {
                assert_eq!(numbers(&got.beginner), vec![1]);
                assert_eq!(numbers(&got.advanced), vec![0]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_selection_is_error() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate_structured()
            .returning(|_, _| Ok("no idea".into()));
        let input = ProducerInput {
            issues: issues(1),
            ..ProducerInput::default()
        };
        let producer = IssueCategorizationProducer::new(Arc::new(generator), 10);
        assert!(producer.produce(&input).await.is_err());
        assert!(producer.fallback(&input).is_fallback());
    }
}
