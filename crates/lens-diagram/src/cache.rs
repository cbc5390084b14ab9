//! Repository-keyed diagram cache using moka
//!
//! Rendered documents live on disk as `{owner}_{repo}_diagram.html` under the
//! cache directory; a moka index remembers handles already produced by this
//! process. The key never includes tree content: once a repository has a
//! document, later renders return it unchanged even if the tree differs.

use crate::document::render_html;
use crate::error::DiagramError;
use crate::layout::{layout, PhysicsParams};
use dashmap::DashMap;
use lens_graph::Graph;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Default document extension
pub const DIAGRAM_EXTENSION: &str = "html";

/// Cache key: repository owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagramKey {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl DiagramKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Deterministic document file name
    ///
    /// Characters outside `[A-Za-z0-9._-]` become `_` so the name never
    /// escapes the cache directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_diagram.{DIAGRAM_EXTENSION}",
            sanitize(&self.owner),
            sanitize(&self.repo)
        )
    }
}

impl fmt::Display for DiagramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A persisted diagram document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramArtifact {
    /// Repository the document belongs to
    pub cache_key: DiagramKey,
    /// File name relative to the cache directory
    pub file_name: String,
    /// Full path of the document
    pub path: PathBuf,
}

/// Outcome of [`DiagramCache::render`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiagramHandle {
    /// Document available on disk
    Cached(DiagramArtifact),
    /// Graph had no nodes; nothing to display and nothing stored
    Empty,
    /// Rendering or storing failed; caller proceeds without a file
    NotCached {
        /// Repository the render was for
        key: DiagramKey,
        /// Failure description
        reason: String,
    },
}

impl DiagramHandle {
    /// Artifact when cached
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> Option<&DiagramArtifact> {
        match self {
            DiagramHandle::Cached(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// True for a degraded render
    #[inline]
    #[must_use]
    pub fn is_not_cached(&self) -> bool {
        matches!(self, DiagramHandle::NotCached { .. })
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Renders answered by an existing document
    pub hits: u64,
    /// Documents written
    pub writes: u64,
    /// Renders degraded to `NotCached`
    pub failures: u64,
}

/// Diagram cache backed by a directory
///
/// Writers for the same key are serialized by a per-key lock, and every
/// document is written to a temporary file and renamed into place, so a
/// reader never observes a partial file. A key's lock is dropped once no
/// render for it is in flight.
#[derive(Debug)]
pub struct DiagramCache {
    dir: PathBuf,
    physics: PhysicsParams,
    index: Cache<DiagramKey, DiagramArtifact>,
    write_locks: DashMap<DiagramKey, Arc<Mutex<()>>>,
    hits: AtomicU64,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl DiagramCache {
    /// Create cache storing documents under `dir`
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            physics: PhysicsParams::default(),
            index: Cache::new(10_000),
            write_locks: DashMap::new(),
            hits: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// With custom physics constants
    #[inline]
    #[must_use]
    pub fn with_physics(mut self, physics: PhysicsParams) -> Self {
        self.physics = physics;
        self
    }

    /// Cache directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for a key
    #[inline]
    #[must_use]
    pub fn path_for(&self, key: &DiagramKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Check whether a document exists for the key
    pub async fn exists(&self, key: &DiagramKey) -> bool {
        self.index.contains_key(key)
            || tokio::fs::try_exists(self.path_for(key))
                .await
                .unwrap_or(false)
    }

    /// Existing artifact for the key, without rendering
    pub async fn lookup(&self, key: &DiagramKey) -> Option<DiagramArtifact> {
        if let Some(artifact) = self.index.get(key).await {
            return Some(artifact);
        }
        let path = self.path_for(key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let artifact = DiagramArtifact {
                cache_key: key.clone(),
                file_name: key.file_name(),
                path,
            };
            self.index.insert(key.clone(), artifact.clone()).await;
            return Some(artifact);
        }
        None
    }

    /// Return the cached document for `key`, rendering `graph` on a miss
    ///
    /// Never fails: an empty graph yields [`DiagramHandle::Empty`] and a
    /// storage failure yields [`DiagramHandle::NotCached`].
    pub async fn render(&self, key: &DiagramKey, graph: &Graph) -> DiagramHandle {
        let lock = self.write_locks.entry(key.clone()).or_default().clone();
        let handle = {
            let _guard = lock.lock().await;
            self.render_locked(key, graph).await
        };
        // Only the map and this call hold the lock: no writer is waiting
        self.write_locks
            .remove_if(key, |_, held| Arc::strong_count(held) <= 2);
        handle
    }

    async fn render_locked(&self, key: &DiagramKey, graph: &Graph) -> DiagramHandle {
        if let Some(artifact) = self.lookup(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "diagram cache hit");
            return DiagramHandle::Cached(artifact);
        }

        if graph.is_empty() {
            tracing::debug!(key = %key, "no structure to display");
            return DiagramHandle::Empty;
        }

        match self.store(key, graph).await {
            Ok(artifact) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                self.index.insert(key.clone(), artifact.clone()).await;
                tracing::info!(
                    key = %key,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "diagram rendered"
                );
                DiagramHandle::Cached(artifact)
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %err, "diagram not cached");
                DiagramHandle::NotCached {
                    key: key.clone(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Forget in-memory handles; documents on disk are kept
    pub fn invalidate_all(&self) {
        self.index.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    async fn store(&self, key: &DiagramKey, graph: &Graph) -> Result<DiagramArtifact, DiagramError> {
        let positions = layout(graph, &self.physics);
        let html = render_html(&key.to_string(), graph, &positions, &self.physics)?;
        let path = self.path_for(key);
        write_atomic(&self.dir, &path, html.as_bytes()).await?;
        Ok(DiagramArtifact {
            cache_key: key.clone(),
            file_name: key.file_name(),
            path,
        })
    }
}

/// Write to a fresh temporary file in `dir`, then rename over `path`
async fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), DiagramError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| DiagramError::io_error(dir, source))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}.{nanos}", std::process::id()));

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .await
        .map_err(|source| DiagramError::io_error(&tmp_path, source))?;

    let written = async {
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    drop(file);
    if let Err(source) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(DiagramError::io_error(&tmp_path, source));
    }

    if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(DiagramError::io_error(path, source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_graph::parse_tree;

    const FIRST: &str = "Directory structure:\n└── alpha/\n    └── one.rs";
    const SECOND: &str = "Directory structure:\n└── beta/\n    └── two.rs";

    #[test]
    fn file_name_is_deterministic_and_safe() {
        let key = DiagramKey::new("octo", "hello-world");
        assert_eq!(key.file_name(), "octo_hello-world_diagram.html");
        assert_eq!(
            DiagramKey::new("a/..", "b\\c").file_name(),
            "a_.._b_c_diagram.html"
        );
    }

    #[tokio::test]
    async fn second_render_is_a_hit_even_with_different_graph() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiagramCache::new(dir.path());
        let key = DiagramKey::new("octo", "repo");

        assert!(!cache.exists(&key).await);
        let first = cache.render(&key, &parse_tree(FIRST)).await;
        assert!(cache.exists(&key).await);
        let second = cache.render(&key, &parse_tree(SECOND)).await;

        assert_eq!(first, second);
        assert_eq!(cache.stats().writes, 1);
        assert_eq!(cache.stats().hits, 1);

        let html = std::fs::read_to_string(cache.path_for(&key)).unwrap();
        assert!(html.contains("alpha"));
        assert!(!html.contains("beta"));
    }

    #[tokio::test]
    async fn existing_file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let key = DiagramKey::new("octo", "repo");
        let first = DiagramCache::new(dir.path())
            .render(&key, &parse_tree(FIRST))
            .await;

        let restarted = DiagramCache::new(dir.path());
        let again = restarted.render(&key, &parse_tree(SECOND)).await;
        assert_eq!(first, again);
        assert_eq!(restarted.stats().writes, 0);
    }

    #[tokio::test]
    async fn empty_graph_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiagramCache::new(dir.path());
        let key = DiagramKey::new("octo", "empty");

        let handle = cache.render(&key, &parse_tree("Directory structure:")).await;
        assert_eq!(handle, DiagramHandle::Empty);
        assert!(!cache.exists(&key).await);
    }

    #[tokio::test]
    async fn unwritable_directory_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let cache = DiagramCache::new(&blocker);
        let key = DiagramKey::new("octo", "repo");
        let handle = cache.render(&key, &parse_tree(FIRST)).await;

        assert!(handle.is_not_cached());
        assert_eq!(cache.stats().failures, 1);
        assert_eq!(cache.stats().writes, 0);
    }

    #[tokio::test]
    async fn concurrent_renders_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(DiagramCache::new(dir.path()));
        let key = DiagramKey::new("octo", "busy");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache.render(&key, &parse_tree(FIRST)).await
            }));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.stats().writes, 1);
        assert!(cache.write_locks.is_empty());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn write_lock_released_after_render() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiagramCache::new(dir.path());
        for repo in ["one", "two", "three"] {
            cache
                .render(&DiagramKey::new("octo", repo), &parse_tree(FIRST))
                .await;
        }
        assert!(cache.write_locks.is_empty());

        // A waiting writer keeps the entry alive
        let key = DiagramKey::new("octo", "one");
        let held = cache.write_locks.entry(key.clone()).or_default().clone();
        cache.render(&key, &parse_tree(FIRST)).await;
        assert!(cache.write_locks.contains_key(&key));
        drop(held);
    }

    #[tokio::test]
    async fn invalidate_keeps_disk_copy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiagramCache::new(dir.path());
        let key = DiagramKey::new("octo", "repo");
        cache.render(&key, &parse_tree(FIRST)).await;

        cache.invalidate_all();
        assert!(cache.lookup(&key).await.is_some());
    }
}
