//! Runtime configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// RepoLens configuration
///
/// Missing keys take their defaults; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LensConfig {
    /// Overall query deadline in seconds
    pub deadline_secs: u64,
    /// Optional cap on each producer
    pub producer_timeout_secs: Option<u64>,
    /// Stored turns included in a chat prompt
    pub chat_history_window: usize,
    /// Optional cap on one chat generation call
    pub chat_timeout_secs: Option<u64>,
    /// Content longer than this is cropped for display
    pub max_display_chars: usize,
    /// Content excerpt length in issue prompts
    pub issue_context_chars: usize,
    /// Content excerpt length in idea prompts
    pub idea_context_chars: usize,
    /// Diagram cache directory
    pub diagram_dir: PathBuf,
}

impl LensConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `ConfigError::Parse` if it is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With overall deadline
    #[inline]
    #[must_use]
    pub fn with_deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = secs;
        self
    }

    /// With per-producer timeout
    #[inline]
    #[must_use]
    pub fn with_producer_timeout_secs(mut self, secs: u64) -> Self {
        self.producer_timeout_secs = Some(secs);
        self
    }

    /// With chat history window
    #[inline]
    #[must_use]
    pub fn with_chat_history_window(mut self, turns: usize) -> Self {
        self.chat_history_window = turns;
        self
    }

    /// With chat generation timeout
    #[inline]
    #[must_use]
    pub fn with_chat_timeout_secs(mut self, secs: u64) -> Self {
        self.chat_timeout_secs = Some(secs);
        self
    }

    /// With display cropping limit
    #[inline]
    #[must_use]
    pub fn with_max_display_chars(mut self, chars: usize) -> Self {
        self.max_display_chars = chars;
        self
    }

    /// With diagram directory
    #[inline]
    #[must_use]
    pub fn with_diagram_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagram_dir = dir.into();
        self
    }

    /// Overall deadline
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Per-producer timeout, if any
    #[inline]
    #[must_use]
    pub fn producer_timeout(&self) -> Option<Duration> {
        self.producer_timeout_secs.map(Duration::from_secs)
    }

    /// Chat generation timeout, if any
    #[inline]
    #[must_use]
    pub fn chat_timeout(&self) -> Option<Duration> {
        self.chat_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 300,
            producer_timeout_secs: None,
            chat_history_window: 5,
            chat_timeout_secs: None,
            max_display_chars: 300_000,
            issue_context_chars: 1_000,
            idea_context_chars: 2_000,
            diagram_dir: PathBuf::from("diagrams"),
        }
    }
}
