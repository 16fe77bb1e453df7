//! Artifact persistence.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//! use politeness_bench::fixture::Condition;
//! use politeness_bench::scoring::RubricConfig;
//! use politeness_bench::storage::{ArtifactKind, ArtifactStore, FsArtifactStore};
//!
//! let store = FsArtifactStore::for_layout(Path::new("./results"), &RubricConfig::basic(), None);
//! store.write(Condition::Polite, 1, ArtifactKind::Prompt, &prompt).await?;
//! let done = store.exists(Condition::Polite, 1, ArtifactKind::Result).await?;
//! ```

pub mod artifacts;

pub use artifacts::{
    layout_root, model_suffix, ArtifactKind, ArtifactStore, FsArtifactStore, MemoryArtifactStore,
    DEFAULT_RESULTS_ROOT, HISTORICAL_DEFAULT_MODEL,
};
