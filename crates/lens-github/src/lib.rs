//! RepoLens GitHub
//!
//! [`RepositoryHost`] over the GitHub REST API.
//!
//! HTTP 404 maps to `NotFound`, transport failures to `NetworkFailure`,
//! request timeouts to `Timeout` and undecodable bodies to
//! `MalformedResponse`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use async_trait::async_trait;
use base64::Engine as _;
use lens_core::{CollaboratorError, Issue, RepoMetadata, RepoRef, RepositoryHost};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Public GitHub API root
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Issues requested per repository
pub const ISSUES_PER_PAGE: u32 = 30;

/// Search results requested per query
pub const SEARCH_PER_PAGE: u32 = 10;

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    /// API root, without trailing slash
    pub api_base: String,
    /// Personal access token
    pub token: Option<String>,
    /// User-Agent header (required by GitHub)
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            user_agent: concat!("repolens/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GithubConfig {
    /// With token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// GitHub REST client
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

impl GithubClient {
    /// Build client
    ///
    /// # Errors
    /// Returns `CollaboratorError::NetworkFailure` if the HTTP client cannot
    /// be constructed or the token is not a valid header value.
    pub fn new(config: GithubConfig) -> Result<Self, CollaboratorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| CollaboratorError::network("token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CollaboratorError::network(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Client settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn repo_url(&self, repo: &RepoRef, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{suffix}",
            self.config.api_base, repo.owner, repo.repo
        )
    }

    fn search_url(&self, query: &str) -> Result<String, CollaboratorError> {
        let per_page = SEARCH_PER_PAGE.to_string();
        reqwest::Url::parse_with_params(
            &format!("{}/search/repositories", self.config.api_base),
            [
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| CollaboratorError::network(format!("search url: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CollaboratorError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, url));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e, self.config.timeout))?;
        serde_json::from_slice(&body).map_err(|e| CollaboratorError::malformed(format!("{url}: {e}")))
    }
}

fn transport_error(err: &reqwest::Error, timeout: Duration) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout(timeout)
    } else {
        CollaboratorError::network(err.to_string())
    }
}

fn status_error(status: StatusCode, url: &str) -> CollaboratorError {
    if status == StatusCode::NOT_FOUND {
        CollaboratorError::not_found(url)
    } else {
        CollaboratorError::network(format!("HTTP {status} from {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct ReadmePayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

fn decode_readme(payload: &ReadmePayload) -> Result<String, CollaboratorError> {
    if let Some(encoding) = payload.encoding.as_deref() {
        if encoding != "base64" {
            return Err(CollaboratorError::malformed(format!(
                "unsupported README encoding {encoding}"
            )));
        }
    }
    // GitHub wraps the base64 body at 60 columns
    let compact: String = payload
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(CollaboratorError::not_found("README"));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| CollaboratorError::malformed(format!("README base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CollaboratorError::malformed(format!("README utf-8: {e}")))
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    #[serde(flatten)]
    issue: Issue,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    items: Vec<RepoMetadata>,
}

// The issues endpoint also lists pull requests
fn open_issues(payload: Vec<IssuePayload>) -> Vec<Issue> {
    payload
        .into_iter()
        .filter(|p| p.pull_request.is_none())
        .map(|p| p.issue)
        .collect()
}

#[async_trait]
impl RepositoryHost for GithubClient {
    async fn metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, CollaboratorError> {
        self.get_json(&self.repo_url(repo, "")).await
    }

    async fn readme(&self, repo: &RepoRef) -> Result<String, CollaboratorError> {
        let payload: ReadmePayload = self.get_json(&self.repo_url(repo, "/readme")).await?;
        decode_readme(&payload)
    }

    async fn issues(&self, repo: &RepoRef) -> Result<Vec<Issue>, CollaboratorError> {
        let url = self.repo_url(
            repo,
            &format!("/issues?state=open&per_page={ISSUES_PER_PAGE}"),
        );
        let payload: Vec<IssuePayload> = self.get_json(&url).await?;
        Ok(open_issues(payload))
    }

    /// Counts the first page of contributors
    async fn contributors_count(&self, contributors_url: &str) -> Result<u64, CollaboratorError> {
        let contributors: Vec<serde_json::Value> = self.get_json(contributors_url).await?;
        Ok(contributors.len() as u64)
    }

    async fn search(&self, query: &str) -> Result<Vec<RepoMetadata>, CollaboratorError> {
        let payload: SearchPayload = self.get_json(&self.search_url(query)?).await?;
        Ok(payload.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn readme(content: &str) -> ReadmePayload {
        ReadmePayload {
            content: content.to_string(),
            encoding: Some("base64".into()),
        }
    }

    #[test]
    fn decodes_wrapped_base64() {
        // "# hello\nworld\n" split across lines
        let payload = readme("IyBoZWxsbwp3\nb3JsZAo=\n");
        assert_eq!(decode_readme(&payload).unwrap(), "# hello\nworld\n");
    }

    #[test]
    fn empty_readme_is_not_found() {
        assert_eq!(decode_readme(&readme("\n")).unwrap_err().kind(), "not_found");
    }

    #[test]
    fn invalid_base64_is_malformed() {
        assert_eq!(
            decode_readme(&readme("not base64!")).unwrap_err().kind(),
            "malformed_response"
        );
        let other = ReadmePayload {
            content: "abc".into(),
            encoding: Some("utf-16".into()),
        };
        assert_eq!(decode_readme(&other).unwrap_err().kind(), "malformed_response");
    }

    #[test]
    fn pull_requests_are_not_issues() {
        let payload: Vec<IssuePayload> = serde_json::from_str(
            r#"[
                {"number": 1, "title": "Bug", "html_url": "u1", "labels": [{"name": "bug"}]},
                {"number": 2, "title": "PR", "html_url": "u2", "pull_request": {"url": "x"}}
            ]"#,
        )
        .unwrap();
        let issues = open_issues(payload);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1);
        assert_eq!(issues[0].labels[0].name, "bug");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_error(StatusCode::NOT_FOUND, "u").kind(), "not_found");
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, "u").kind(),
            "network_failure"
        );
    }

    #[test]
    fn urls_and_headers() {
        let client = GithubClient::new(
            GithubConfig::default()
                .with_api_base("http://localhost:9/")
                .with_token("abc"),
        )
        .unwrap();
        assert_eq!(
            client.repo_url(&RepoRef::new("octo", "hello"), "/readme"),
            "http://localhost:9/repos/octo/hello/readme"
        );
        assert!(GithubClient::new(GithubConfig::default().with_token("bad\ntoken")).is_err());
    }

    #[test]
    fn search_query_is_encoded() {
        let client =
            GithubClient::new(GithubConfig::default().with_api_base("http://localhost:9")).unwrap();
        let url = client.search_url("octo/hello world").unwrap();
        assert!(url.starts_with("http://localhost:9/search/repositories?q=octo%2Fhello+world"));
        assert!(url.ends_with("&sort=stars&order=desc&per_page=10"));
    }

    #[test]
    fn search_items_decode_as_metadata() {
        let payload: SearchPayload = serde_json::from_str(
            r#"{"total_count": 1, "items": [{
                "full_name": "octo/hello", "name": "hello", "stargazers_count": 9,
                "html_url": "https://github.com/octo/hello", "topics": ["cli"],
                "updated_at": "2026-01-01T00:00:00Z"
            }]}"#,
        )
        .unwrap();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].name.as_deref(), Some("hello"));
        assert_eq!(payload.items[0].topics, vec!["cli"]);
        assert_eq!(payload.items[0].stargazers_count, 9);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_failure() {
        let client = GithubClient::new(
            GithubConfig::default()
                .with_api_base("http://127.0.0.1:9")
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = client
            .metadata(&RepoRef::new("octo", "hello"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
