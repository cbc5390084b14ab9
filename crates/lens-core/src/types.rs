//! Core types for RepoLens
//!
//! Repository references and metadata, artifact slots and results, and the
//! aggregated view model.

use crate::error::QueryError;
use lens_diagram::{DiagramHandle, DiagramKey};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Repository reference: `(owner, repo)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoRef {
    /// Create reference
    #[inline]
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse a repository URL or `owner/repo` path
    ///
    /// The last two `/`-separated segments are taken as owner and name.
    ///
    /// # Errors
    /// Returns `QueryError::InvalidSource` when fewer than two non-empty
    /// segments are present.
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let trimmed = source.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let mut segments = trimmed.rsplit('/');
        match (segments.next(), segments.next()) {
            (Some(repo), Some(owner)) if !repo.is_empty() && !owner.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(QueryError::InvalidSource(source.to_string())),
        }
    }

    /// `owner/repo`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Diagram cache key for this repository
    #[must_use]
    pub fn diagram_key(&self) -> DiagramKey {
        DiagramKey::new(&self.owner, &self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for RepoRef {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// License block of repository metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    /// License display name
    pub name: Option<String>,
}

/// Repository metadata as reported by the host
///
/// Every field is optional on the wire; missing counts read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoMetadata {
    /// `owner/repo`
    pub full_name: Option<String>,
    /// Short description
    pub description: Option<String>,
    /// Star count
    pub stargazers_count: u64,
    /// Fork count
    pub forks_count: u64,
    /// Open issue count
    pub open_issues_count: u64,
    /// Watcher count
    pub watchers_count: u64,
    /// Endpoint listing contributors
    pub contributors_url: Option<String>,
    /// Primary language
    pub language: Option<String>,
    /// License
    pub license: Option<License>,
    /// Repository name without owner
    pub name: Option<String>,
    /// Web page
    pub html_url: Option<String>,
    /// Topic tags
    pub topics: Vec<String>,
    /// Last update timestamp as reported by the host
    pub updated_at: Option<String>,
}

/// Issue label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Open issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Title
    pub title: String,
    /// Body text
    pub body: Option<String>,
    /// Web URL
    pub html_url: String,
    /// Labels
    pub labels: Vec<Label>,
}

/// Output of the ingestion collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedRepository {
    /// Human-readable ingestion summary
    pub summary: String,
    /// Indentation-formatted tree text
    pub tree: String,
    /// Concatenated file content
    pub content: String,
}

/// Generated repository description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectDescription {
    /// Brief summary, at most about 100 words
    pub summary: String,
    /// Concrete use cases
    #[serde(default)]
    pub use_cases: Vec<String>,
    /// What a contributor would learn
    #[serde(default)]
    pub contribution_insights: Vec<String>,
}

/// Raw issue selection as returned by the model: indices per bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IssueSelection {
    /// Indices of issues suitable for newcomers
    #[serde(default)]
    pub beginner_issues: Vec<i64>,
    /// Indices of issues needing moderate familiarity
    #[serde(default)]
    pub intermediate_issues: Vec<i64>,
    /// Indices of issues needing deep understanding
    #[serde(default)]
    pub advanced_issues: Vec<i64>,
}

/// Issues resolved per difficulty bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedIssues {
    /// Issues for newcomers
    pub beginner: Vec<Issue>,
    /// Intermediate issues
    pub intermediate: Vec<Issue>,
    /// Advanced issues
    pub advanced: Vec<Issue>,
}

impl CategorizedIssues {
    /// True when every bucket is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beginner.is_empty() && self.intermediate.is_empty() && self.advanced.is_empty()
    }
}

/// Popularity and technical metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    /// Stars
    pub stars: u64,
    /// Forks
    pub forks: u64,
    /// Open issues
    pub open_issues: u64,
    /// Watchers
    pub watchers: u64,
    /// Contributors
    pub contributors: u64,
    /// Primary language, `"Unknown"` when absent
    pub language: String,
    /// License name, `"No license"` when absent
    pub license: String,
}

/// Named position in the view model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Repository summary
    Summary,
    /// Installation guide
    InstallGuide,
    /// Structure diagram
    Diagram,
    /// Repository metrics
    Metrics,
    /// Categorized issues
    IssueCategorization,
    /// Feature idea
    CreativeIdea,
    /// Mermaid architecture overview
    Overview,
}

impl Slot {
    /// All slots in display order
    pub const ALL: [Slot; 7] = [
        Slot::Summary,
        Slot::InstallGuide,
        Slot::Diagram,
        Slot::Metrics,
        Slot::IssueCategorization,
        Slot::CreativeIdea,
        Slot::Overview,
    ];

    /// Stable name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Summary => "summary",
            Slot::InstallGuide => "install_guide",
            Slot::Diagram => "diagram",
            Slot::Metrics => "metrics",
            Slot::IssueCategorization => "issue_categorization",
            Slot::CreativeIdea => "creative_idea",
            Slot::Overview => "overview",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArtifactPayload {
    /// Repository description
    Summary(ProjectDescription),
    /// Markdown with shell blocks
    InstallGuide(String),
    /// Diagram handle
    Diagram(DiagramHandle),
    /// Metrics
    Metrics(ProjectMetrics),
    /// Issue buckets
    Issues(CategorizedIssues),
    /// Feature idea text
    Idea(String),
    /// Mermaid source
    Overview(String),
}

/// Whether a result came from the producer or its fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Produced normally
    Ok,
    /// Documented fallback substituted
    Fallback,
}

/// One populated slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactResult {
    /// Slot
    pub slot: Slot,
    /// Origin
    pub status: ArtifactStatus,
    /// Value
    pub payload: ArtifactPayload,
}

impl ArtifactResult {
    /// Successful result
    #[inline]
    #[must_use]
    pub fn ok(slot: Slot, payload: ArtifactPayload) -> Self {
        Self {
            slot,
            status: ArtifactStatus::Ok,
            payload,
        }
    }

    /// Fallback result
    #[inline]
    #[must_use]
    pub fn fallback(slot: Slot, payload: ArtifactPayload) -> Self {
        Self {
            slot,
            status: ArtifactStatus::Fallback,
            payload,
        }
    }

    /// True for a fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.status == ArtifactStatus::Fallback
    }
}

/// Aggregated results, one per slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewModel {
    results: BTreeMap<Slot, ArtifactResult>,
}

impl ViewModel {
    /// Create empty view model
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result, replacing any previous one for the slot
    pub fn insert(&mut self, result: ArtifactResult) {
        self.results.insert(result.slot, result);
    }

    /// Result for a slot
    #[inline]
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&ArtifactResult> {
        self.results.get(&slot)
    }

    /// True when the slot is populated
    #[inline]
    #[must_use]
    pub fn contains(&self, slot: Slot) -> bool {
        self.results.contains_key(&slot)
    }

    /// Populated slot count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when nothing is populated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in slot order
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactResult> {
        self.results.values()
    }

    /// Slots that fell back
    #[must_use]
    pub fn fallbacks(&self) -> Vec<Slot> {
        self.iter().filter(|r| r.is_fallback()).map(|r| r.slot).collect()
    }
}
