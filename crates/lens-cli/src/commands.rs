//! Subcommand implementations; each returns the text to print

use anyhow::{Context, Result};
use lens_core::producers::project_metrics;
use lens_core::{LensConfig, RepoRef, RepositoryHost};
use lens_diagram::{DiagramCache, DiagramHandle, DiagramKey};
use lens_github::{GithubClient, GithubConfig};
use lens_graph::parse_tree;
use std::path::{Path, PathBuf};

pub(crate) fn load_config(path: Option<&Path>) -> Result<LensConfig> {
    match path {
        Some(path) => LensConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(LensConfig::default()),
    }
}

async fn read_tree(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading tree file {}", path.display()))
}

pub(crate) async fn graph(tree_file: &Path, json: bool) -> Result<String> {
    let graph = parse_tree(&read_tree(tree_file).await?);
    if json {
        return Ok(serde_json::to_string_pretty(&graph)?);
    }
    let max_depth = graph
        .max_depth()
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    Ok(format!(
        "nodes: {}\nedges: {}\nroots: {}\nmax depth: {max_depth}",
        graph.node_count(),
        graph.edge_count(),
        graph.roots().count(),
    ))
}

pub(crate) async fn diagram(
    tree_file: &Path,
    owner: &str,
    repo: &str,
    dir: Option<PathBuf>,
    config: &LensConfig,
) -> Result<String> {
    let graph = parse_tree(&read_tree(tree_file).await?);
    let cache = DiagramCache::new(dir.unwrap_or_else(|| config.diagram_dir.clone()));
    let handle = cache.render(&DiagramKey::new(owner, repo), &graph).await;
    if let DiagramHandle::NotCached { reason, .. } = &handle {
        tracing::warn!(%reason, "diagram was not stored");
    }
    Ok(serde_json::to_string_pretty(&handle)?)
}

pub(crate) async fn metrics(source: &str, token: Option<String>) -> Result<String> {
    let repo = RepoRef::parse(source)?;
    let mut github = GithubConfig::default();
    if let Some(token) = token {
        github = github.with_token(token);
    }
    let client = GithubClient::new(github)?;

    let metadata = client
        .metadata(&repo)
        .await
        .with_context(|| format!("fetching metadata for {repo}"))?;
    let contributors = match metadata.contributors_url.as_deref() {
        Some(url) => client.contributors_count(url).await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "contributor count unavailable");
            0
        }),
        None => 0,
    };
    Ok(serde_json::to_string_pretty(&project_metrics(
        &metadata,
        contributors,
    ))?)
}
