//! RepoLens Core
//!
//! Turns an ingested repository into a bundle of derived artifacts:
//! - Fans out to independent producers with per-producer fallbacks
//! - Bounds every query with one deadline
//! - Keeps per-session chat memory with a bounded prompt window
//! - Recommends and README-ranks repositories for a search query
//! - Talks to generation, hosting and ingestion services through traits
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     ingestor: Arc<dyn Ingestor>,
//! #     host: Arc<dyn RepositoryHost>,
//! #     generator: Arc<dyn Generator>,
//! # ) -> Result<(), QueryError> {
//! let config = LensConfig::new();
//! let cache = Arc::new(lens_diagram::DiagramCache::new(&config.diagram_dir));
//! let processor = QueryProcessor::new(config, ingestor, host, generator, cache);
//!
//! let report = processor.process("https://github.com/octo/hello").await?;
//! println!("{} slots, {} fell back", report.view.len(), report.view.fallbacks().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod chat;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod producers;
pub mod prompts;
pub mod query;
pub mod search;
pub mod types;

pub use chat::{
    ChatRequest, ChatResponse, ChatService, ChatSession, ChatSessionStore, Role, Turn,
    ERROR_FALLBACK, REPHRASE_FALLBACK,
};
pub use collaborators::{Generator, Ingestor, RepositoryHost};
pub use config::LensConfig;
pub use error::{CollaboratorError, ConfigError, IngestError, QueryError};
pub use orchestrator::ArtifactOrchestrator;
pub use producers::{ArtifactProducer, ProducerInput};
pub use prompts::PromptKind;
pub use lens_structured::Extracted;
pub use query::{crop_content, QueryProcessor, QueryReport};
pub use search::{RepoRanking, RepoRecommendation, RepositorySearch, SearchHit};
pub use types::{
    ArtifactPayload, ArtifactResult, ArtifactStatus, CategorizedIssues, IngestedRepository,
    Issue, IssueSelection, Label, License, ProjectDescription, ProjectMetrics, RepoMetadata,
    RepoRef, Slot, ViewModel,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with RepoLens Core
    pub use crate::{
        ArtifactOrchestrator, ArtifactPayload, ArtifactResult, ChatService, ChatSessionStore,
        CollaboratorError, Generator, Ingestor, LensConfig, QueryError, QueryProcessor,
        RepoRef, RepositoryHost, RepositorySearch, Slot, ViewModel,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
