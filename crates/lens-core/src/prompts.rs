//! Prompt construction
//!
//! Each prompt opens with a fixed marker line so replies can be routed per
//! kind by test doubles and logs ([`PromptKind::classify`]).

use crate::types::{Issue, RepoRef};
use serde::Serialize;
use std::fmt::Write as _;

/// Kind of generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Repository description
    Summary,
    /// Installation commands from a README
    InstallGuide,
    /// Issue difficulty buckets
    IssueSelection,
    /// Feature idea
    CreativeIdea,
    /// Mermaid overview
    Overview,
    /// Chat turn
    Chat,
    /// Repository recommendations for a search query
    RepoSearch,
    /// README-based ranking of search candidates
    RepoRanking,
}

impl PromptKind {
    /// All kinds
    pub const ALL: [PromptKind; 8] = [
        PromptKind::Summary,
        PromptKind::InstallGuide,
        PromptKind::IssueSelection,
        PromptKind::CreativeIdea,
        PromptKind::Overview,
        PromptKind::Chat,
        PromptKind::RepoSearch,
        PromptKind::RepoRanking,
    ];

    /// Opening line of prompts of this kind
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            PromptKind::Summary => "Analyze this repository.",
            PromptKind::InstallGuide => "Extract installation commands.",
            PromptKind::IssueSelection => "Categorize these issues.",
            PromptKind::CreativeIdea => "Suggest a feature idea.",
            PromptKind::Overview => "Sketch the architecture.",
            PromptKind::Chat => "Continue this conversation about a repository.",
            PromptKind::RepoSearch => "Recommend repositories.",
            PromptKind::RepoRanking => "Rank these repositories.",
        }
    }

    /// Kind of a prompt built by this module
    #[must_use]
    pub fn classify(prompt: &str) -> Option<PromptKind> {
        let first = prompt.lines().next()?;
        PromptKind::ALL.into_iter().find(|kind| first == kind.marker())
    }
}

/// Prefix of `text` holding at most `chars` characters
#[must_use]
pub fn excerpt(text: &str, chars: usize) -> &str {
    text.char_indices().nth(chars).map_or(text, |(idx, _)| &text[..idx])
}

/// Repository description prompt
#[must_use]
pub fn summary(tree: &str, content: &str) -> String {
    format!(
        "{}\n\nRepository structure:\n{tree}\n\nRepository content:\n{content}\n\n\
Provide:\n\
1. A brief summary of the repository (at most 100 words)\n\
2. Three specific use cases for this project\n\
3. Three specific areas a contributor would learn about by working on it\n\n\
Answer as JSON with keys 'summary', 'use_cases', 'contribution_insights'.",
        PromptKind::Summary.marker()
    )
}

/// Installation guide prompt
#[must_use]
pub fn install_guide(readme: &str) -> String {
    format!(
        "{}\n\nREADME:\n{readme}\n\n\
List ONLY the terminal commands needed to clone, install and run the project, \
as a step-by-step guide in bash code blocks:\n\
```bash\n\
# Step 1: Clone the repository\n\
git clone [repository-url]\n\
cd [repository-name]\n\n\
# Step 2: Install dependencies\n\
[install command]\n\n\
# Step 3: Run the project\n\
[run command]\n\
```\n\
Include every supported way to do it. If the README lacks commands, give the \
usual ones for the project type. Brief comments only, no prose.",
        PromptKind::InstallGuide.marker()
    )
}

#[derive(Serialize)]
struct IssueLine<'a> {
    index: usize,
    number: u64,
    title: &'a str,
    labels: Vec<&'a str>,
}

/// Issue categorization prompt
///
/// Issues are listed with their position in `issues`; the reply refers to
/// them by that index.
#[must_use]
pub fn issue_selection(repo: &RepoRef, issues: &[Issue], content_excerpt: &str) -> String {
    let lines: Vec<IssueLine<'_>> = issues
        .iter()
        .enumerate()
        .map(|(index, issue)| IssueLine {
            index,
            number: issue.number,
            title: &issue.title,
            labels: issue.labels.iter().map(|l| l.name.as_str()).collect(),
        })
        .collect();
    let listing = serde_json::to_string_pretty(&lines).unwrap_or_default();

    format!(
        "{}\n\nIssues from the repository '{repo}':\n{listing}\n\n\
Repository content:\n{content_excerpt}\n\n\
Sort the issues into three categories:\n\
1. Beginner: suitable for newcomers to the project\n\
2. Intermediate: requires moderate familiarity with the project\n\
3. Advanced: requires deep understanding of the project\n\n\
Pick up to 3 of the most relevant issues per category and return their indices.\n\
Answer as JSON with keys 'beginner_issues', 'intermediate_issues', 'advanced_issues', \
each an array of integers.",
        PromptKind::IssueSelection.marker()
    )
}

/// Feature idea prompt
#[must_use]
pub fn creative_idea(repo: &RepoRef, content_excerpt: &str) -> String {
    format!(
        "{}\n\nSuggest 1 creative and innovative feature for the GitHub project '{}' \
described as: '{content_excerpt}'. Keep it to 1-2 sentences of plain text without \
symbols, special characters or formatting.",
        PromptKind::CreativeIdea.marker(),
        repo.repo
    )
}

/// Mermaid overview prompt
#[must_use]
pub fn overview(tree: &str) -> String {
    format!(
        "{}\n\nCreate a high-level Mermaid diagram of the main components of this \
codebase and their relationships.\n\nDirectory structure:\n{tree}\n\n\
Return only the Mermaid code, starting with ```mermaid and ending with ```. \
Use graph TD and at most 10 nodes.",
        PromptKind::Overview.marker()
    )
}

/// Chat prompt from repository context and the recent turn window
#[must_use]
pub fn chat<'a>(
    summary: &str,
    content: &str,
    window: impl IntoIterator<Item = (&'a str, &'a str)>,
    message: &str,
) -> String {
    let mut history = String::new();
    for (role, text) in window {
        let _ = writeln!(history, "{role}: {text}");
    }
    format!(
        "{}\n\nRepository context:\nSummary: {summary}\nContent: {content}\n\n\
Chat history:\n{history}\n\
The user says: \"{message}\"\n\n\
Reply in a friendly, conversational tone: answer the question directly, draw on the \
repository context when relevant, and use concrete code references where helpful. \
Keep it concise.",
        PromptKind::Chat.marker()
    )
}

/// Repository recommendation prompt
#[must_use]
pub fn repo_search(query: &str, limit: usize) -> String {
    format!(
        "{}\n\nFind the best GitHub repositories matching this search query: \"{query}\"\n\n\
Return a JSON array with one object per repository and these fields:\n\
- \"repo_full_name\": the repository as \"owner/repo\"\n\
- \"description\": a brief description\n\
- \"language\": the main programming language\n\
- \"match_reason\": why this repository matches the query\n\n\
List at most {limit} real, active and maintained repositories with more than 5 files. \
Answer with ONLY the JSON array.",
        PromptKind::RepoSearch.marker()
    )
}

/// README ranking prompt over serialized candidates
#[must_use]
pub fn repo_ranking<T: Serialize>(query: &str, candidates: &[T], keep: usize) -> String {
    let listing = serde_json::to_string_pretty(candidates).unwrap_or_default();
    format!(
        "{}\n\nSearch query: \"{query}\"\n\nRepositories with their READMEs:\n{listing}\n\n\
Rank the repositories by how well they match the query, considering how well their \
purpose aligns with it, the quality of their documentation and the relevance of the \
features described.\n\
Return a JSON array with these fields per repository:\n\
- \"repo_full_name\": the full name of the repository\n\
- \"relevance_score\": a number between 0 and 1\n\
- \"match_explanation\": why the repository is a good match\n\n\
Sort by relevance_score, highest first, and keep the top {keep}. \
Answer with ONLY the JSON array.",
        PromptKind::RepoRanking.marker()
    )
}
