//! Testing utilities for RepoLens workspace
//!
//! Scripted collaborators and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use lens_core::{
    CollaboratorError, Generator, IngestError, IngestedRepository, Ingestor, Issue, Label,
    License, PromptKind, RepoMetadata, RepoRef, RepositoryHost,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const SAMPLE_TREE: &str = "Directory structure:
└── hello/
    ├── Cargo.toml
    ├── README.md
    └── src/
        ├── lib.rs
        └── main.rs";

pub const SAMPLE_CONTENT: &str = "================================================
FILE: src/lib.rs
================================================
pub fn greet() -> &'static str { \"hello\" }
";

pub const SAMPLE_README: &str = "# hello\n\nInstall with `cargo install hello`, run with `hello`.";

pub fn sample_repo() -> RepoRef {
    RepoRef::new("octo", "hello")
}

pub fn sample_issues() -> Vec<Issue> {
    [
        (1, "Fix typo in README", "good first issue"),
        (2, "Add --verbose flag", "enhancement"),
        (3, "Rewrite scheduler", "performance"),
    ]
    .into_iter()
    .map(|(number, title, label)| Issue {
        number,
        title: title.to_string(),
        body: None,
        html_url: format!("https://github.com/octo/hello/issues/{number}"),
        labels: vec![Label {
            name: label.to_string(),
        }],
    })
    .collect()
}

pub fn sample_metadata() -> RepoMetadata {
    RepoMetadata {
        full_name: Some("octo/hello".into()),
        description: Some("Greets".into()),
        stargazers_count: 42,
        forks_count: 7,
        open_issues_count: 3,
        watchers_count: 42,
        contributors_url: Some("https://api.github.com/repos/octo/hello/contributors".into()),
        language: Some("Rust".into()),
        license: Some(License {
            name: Some("MIT License".into()),
        }),
        name: Some("hello".into()),
        html_url: Some("https://github.com/octo/hello".into()),
        topics: vec!["greeting".into()],
        updated_at: Some("2026-01-01T00:00:00Z".into()),
    }
}

pub fn sample_ingest() -> IngestedRepository {
    IngestedRepository {
        summary: "Repository: octo/hello\nFiles analyzed: 4\nEstimated tokens: 120".into(),
        tree: SAMPLE_TREE.into(),
        content: SAMPLE_CONTENT.into(),
    }
}

/// Well-formed reply for each prompt kind
pub fn default_reply(kind: PromptKind) -> String {
    match kind {
        PromptKind::Summary => serde_json::json!([{
            "summary": "A tiny greeting library.",
            "use_cases": ["greeting", "demos", "tests"],
            "contribution_insights": ["crates", "testing", "docs"]
        }])
        .to_string(),
        PromptKind::InstallGuide => "```bash\ncargo install hello\nhello\n```".into(),
        PromptKind::IssueSelection => serde_json::json!({
            "beginner_issues": [0],
            "intermediate_issues": [1],
            "advanced_issues": [2]
        })
        .to_string(),
        PromptKind::CreativeIdea => "Let the greeting adapt to the time of day.".into(),
        PromptKind::Overview => "```mermaid\ngraph TD\n  lib --> main\n```".into(),
        PromptKind::Chat => "Happy to help with that.".into(),
        PromptKind::RepoSearch => format!(
            "Here are some matches:\n{}",
            serde_json::json!([{
                "repo_full_name": "octo/hello",
                "description": "A tiny greeting library",
                "language": "Rust",
                "match_reason": "Small codebase with friendly issues"
            }])
        ),
        PromptKind::RepoRanking => serde_json::json!([{
            "repo_full_name": "octo/hello",
            "relevance_score": 0.9,
            "match_explanation": "The README covers exactly this use case"
        }])
        .to_string(),
    }
}

/// Generator answering by prompt kind
///
/// Every prompt is recorded. Unscripted kinds get [`default_reply`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<HashMap<PromptKind, Result<String, CollaboratorError>>>,
    delays: Mutex<HashMap<PromptKind, Duration>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(self, kind: PromptKind, text: impl Into<String>) -> Self {
        self.replies.lock().insert(kind, Ok(text.into()));
        self
    }

    #[must_use]
    pub fn fail(self, kind: PromptKind, err: CollaboratorError) -> Self {
        self.replies.lock().insert(kind, Err(err));
        self
    }

    #[must_use]
    pub fn delay(self, kind: PromptKind, delay: Duration) -> Self {
        self.delays.lock().insert(kind, delay);
        self
    }

    pub fn prompts_of(&self, kind: PromptKind) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|p| PromptKind::classify(p) == Some(kind))
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        let Some(kind) = PromptKind::classify(prompt) else {
            return Err(CollaboratorError::malformed("unrecognized prompt"));
        };
        let delay = self.delays.lock().get(&kind).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.replies.lock().get(&kind).cloned();
        scripted.unwrap_or_else(|| Ok(default_reply(kind)))
    }
}

/// Repository host backed by fixed data
#[derive(Debug)]
pub struct StaticHost {
    pub metadata: Result<RepoMetadata, CollaboratorError>,
    pub readme: Result<String, CollaboratorError>,
    pub issues: Result<Vec<Issue>, CollaboratorError>,
    pub contributors: Result<u64, CollaboratorError>,
    /// Searchable repositories; a query returns entries whose full name
    /// contains it
    pub catalog: Result<Vec<RepoMetadata>, CollaboratorError>,
}

impl Default for StaticHost {
    fn default() -> Self {
        Self {
            metadata: Ok(sample_metadata()),
            readme: Ok(SAMPLE_README.to_string()),
            issues: Ok(sample_issues()),
            contributors: Ok(5),
            catalog: Ok(vec![sample_metadata()]),
        }
    }
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host where every call fails
    pub fn unreachable() -> Self {
        let down = CollaboratorError::network("connection refused");
        Self {
            metadata: Err(down.clone()),
            readme: Err(down.clone()),
            issues: Err(down.clone()),
            contributors: Err(down.clone()),
            catalog: Err(down),
        }
    }
}

#[async_trait]
impl RepositoryHost for StaticHost {
    async fn metadata(&self, _repo: &RepoRef) -> Result<RepoMetadata, CollaboratorError> {
        self.metadata.clone()
    }

    async fn readme(&self, _repo: &RepoRef) -> Result<String, CollaboratorError> {
        self.readme.clone()
    }

    async fn issues(&self, _repo: &RepoRef) -> Result<Vec<Issue>, CollaboratorError> {
        self.issues.clone()
    }

    async fn contributors_count(&self, _contributors_url: &str) -> Result<u64, CollaboratorError> {
        self.contributors.clone()
    }

    async fn search(&self, query: &str) -> Result<Vec<RepoMetadata>, CollaboratorError> {
        let query = query.to_lowercase();
        Ok(self
            .catalog
            .clone()?
            .into_iter()
            .filter(|m| {
                m.full_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .collect())
    }
}

/// Ingestor returning a fixed result after an optional delay
#[derive(Debug)]
pub struct StaticIngestor {
    pub result: Result<IngestedRepository, IngestError>,
    pub delay: Duration,
}

impl Default for StaticIngestor {
    fn default() -> Self {
        Self {
            result: Ok(sample_ingest()),
            delay: Duration::ZERO,
        }
    }
}

impl StaticIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: IngestError) -> Self {
        Self {
            result: Err(err),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Ingestor for StaticIngestor {
    async fn ingest(&self, _source: &str) -> Result<IngestedRepository, IngestError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
