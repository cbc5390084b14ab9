//! Repository search with README ranking
//!
//! A query goes through three steps:
//! 1. the generator recommends candidate repositories as a JSON array
//! 2. each candidate is looked up on the host and its README fetched
//! 3. the generator ranks the enriched candidates by README relevance
//!
//! Both generator replies pass through the array parser. A missing or
//! malformed recommendation list yields no results; a missing or malformed
//! ranking keeps the first [`MAX_RANKED`] candidates in lookup order.

use crate::collaborators::{Generator, RepositoryHost};
use crate::prompts;
use crate::types::{RepoMetadata, RepoRef};
use lens_structured::{Extracted, StructuredResponseParser};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Candidates requested from the generator
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Results kept after ranking
pub const MAX_RANKED: usize = 3;

/// Candidate suggested by the generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoRecommendation {
    /// `owner/repo`
    pub repo_full_name: String,
    /// Brief description
    pub description: String,
    /// Main language
    pub language: String,
    /// Why it matches the query
    pub match_reason: String,
}

/// Ranking entry returned by the generator
///
/// All fields are required; an entry missing one makes the whole ranking
/// malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRanking {
    /// `owner/repo`
    pub repo_full_name: String,
    /// Relevance between 0 and 1
    pub relevance_score: f64,
    /// Why it matches
    pub match_explanation: String,
}

/// Search result shown to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// `owner/repo` as reported by the host
    pub full_name: String,
    /// Repository name
    pub name: String,
    /// Description from the recommendation
    pub description: String,
    /// Main language as reported by the host
    pub language: String,
    /// Stars
    pub stars: u64,
    /// Forks
    pub forks: u64,
    /// Open issues
    pub issues: u64,
    /// Last update
    pub updated_at: String,
    /// Web page
    pub html_url: String,
    /// Topic tags
    pub topics: Vec<String>,
    /// Recommendation reason
    pub good_fit: String,
    /// README text, empty when unavailable
    pub readme: String,
    /// Ranking score, set on ranked results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    /// Ranking explanation, set on ranked results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_explanation: Option<String>,
}

impl SearchHit {
    fn from_parts(recommendation: &RepoRecommendation, metadata: RepoMetadata, readme: String) -> Self {
        Self {
            full_name: metadata.full_name.unwrap_or_default(),
            name: metadata.name.unwrap_or_default(),
            description: recommendation.description.clone(),
            language: metadata.language.unwrap_or_default(),
            stars: metadata.stargazers_count,
            forks: metadata.forks_count,
            issues: metadata.open_issues_count,
            updated_at: metadata.updated_at.unwrap_or_default(),
            html_url: metadata.html_url.unwrap_or_default(),
            topics: metadata.topics,
            good_fit: recommendation.match_reason.clone(),
            readme,
            relevance_score: None,
            match_explanation: None,
        }
    }
}

/// Generator-backed repository search
#[derive(Clone)]
pub struct RepositorySearch {
    generator: Arc<dyn Generator>,
    host: Arc<dyn RepositoryHost>,
    parser: StructuredResponseParser,
}

impl std::fmt::Debug for RepositorySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySearch").finish_non_exhaustive()
    }
}

impl RepositorySearch {
    /// Create search service
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, host: Arc<dyn RepositoryHost>) -> Self {
        Self {
            generator,
            host,
            parser: StructuredResponseParser::array(),
        }
    }

    /// Search, enrich and rank; never fails
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        tracing::info!(query, "searching repositories");
        let recommendations = self.recommend(query).await.into_inner();
        if recommendations.is_empty() {
            return Vec::new();
        }
        let hits = self.enrich(&recommendations).await;
        self.rank(query, hits).await.into_inner()
    }

    /// Candidate repositories for `query`
    ///
    /// Entries without a repository name are dropped and at most
    /// [`MAX_RECOMMENDATIONS`] are kept. Falls back to an empty list.
    pub async fn recommend(&self, query: &str) -> Extracted<Vec<RepoRecommendation>> {
        let prompt = prompts::repo_search(query, MAX_RECOMMENDATIONS);
        let reply = self.generator.generate(&prompt).await;
        let extracted: Extracted<Vec<RepoRecommendation>> = match reply {
            Ok(reply) => self.parser.extract_or(&reply, Vec::new),
            Err(err) => {
                tracing::warn!(error = %err, "repository recommendation failed");
                Extracted::Fallback(Vec::new())
            }
        };
        if extracted.is_fallback() {
            tracing::warn!(query, "no usable recommendations");
        }
        extracted.map(|mut recommendations| {
            recommendations.retain(|r| !r.repo_full_name.trim().is_empty());
            recommendations.truncate(MAX_RECOMMENDATIONS);
            recommendations
        })
    }

    /// Host metadata and README for each recommendation, in order
    ///
    /// Candidates the host cannot find are skipped. A missing README is
    /// left empty.
    pub async fn enrich(&self, recommendations: &[RepoRecommendation]) -> Vec<SearchHit> {
        let lookups = recommendations.iter().map(|r| self.lookup(r));
        futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn lookup(&self, recommendation: &RepoRecommendation) -> Option<SearchHit> {
        let name = recommendation.repo_full_name.trim();
        let metadata = match self.host.search(name).await {
            Ok(items) => items.into_iter().next()?,
            Err(err) => {
                tracing::warn!(repo = name, error = %err, "repository lookup failed");
                return None;
            }
        };
        let readme = match RepoRef::parse(name) {
            Ok(repo) => self.host.readme(&repo).await.unwrap_or_else(|err| {
                tracing::debug!(repo = name, error = %err, "README unavailable");
                String::new()
            }),
            Err(_) => String::new(),
        };
        Some(SearchHit::from_parts(recommendation, metadata, readme))
    }

    /// Order `hits` by README relevance and keep the top [`MAX_RANKED`]
    ///
    /// Hits the ranking does not mention score 0; ties keep their input
    /// order. Falls back to the first [`MAX_RANKED`] hits unchanged.
    pub async fn rank(&self, query: &str, mut hits: Vec<SearchHit>) -> Extracted<Vec<SearchHit>> {
        if hits.is_empty() {
            return Extracted::Success(hits);
        }
        let prompt = prompts::repo_ranking(query, &hits, MAX_RANKED);
        let rankings: Extracted<Vec<RepoRanking>> = match self.generator.generate(&prompt).await {
            Ok(reply) => self.parser.extract_or(&reply, Vec::new),
            Err(err) => {
                tracing::warn!(error = %err, "README ranking failed");
                Extracted::Fallback(Vec::new())
            }
        };
        let Extracted::Success(rankings) = rankings else {
            tracing::warn!(query, "keeping unranked order");
            hits.truncate(MAX_RANKED);
            return Extracted::Fallback(hits);
        };
        Extracted::Success(apply_rankings(hits, &rankings))
    }
}

/// Sort by score, highest first, keep the top entries and annotate them
#[must_use]
pub fn apply_rankings(mut hits: Vec<SearchHit>, rankings: &[RepoRanking]) -> Vec<SearchHit> {
    // Later entries for the same name win
    let by_name: HashMap<&str, &RepoRanking> = rankings
        .iter()
        .map(|r| (r.repo_full_name.as_str(), r))
        .collect();
    let score = |hit: &SearchHit| {
        by_name
            .get(hit.full_name.as_str())
            .map_or(0.0, |r| r.relevance_score)
    };

    hits.sort_by(|a, b| score(b).total_cmp(&score(a)));
    hits.truncate(MAX_RANKED);
    for hit in &mut hits {
        let ranking = by_name.get(hit.full_name.as_str());
        hit.relevance_score = Some(ranking.map_or(0.0, |r| r.relevance_score));
        hit.match_explanation = Some(
            ranking
                .map(|r| r.match_explanation.clone())
                .unwrap_or_default(),
        );
    }
    hits
}
