//! Prompt and result artifact storage.
//!
//! Every fixture owns exactly two artifact slots keyed by
//! `(condition, sequence, kind)`. The filesystem store lays them out as
//! `<root>/<condition>/<n>-prompt.txt` and `<root>/<condition>/<n>-result.json`,
//! which matches existing result sets on disk.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::fixture::Condition;
use crate::scoring::RubricConfig;

/// Default artifact root.
pub const DEFAULT_RESULTS_ROOT: &str = "./results";

/// Model whose artifacts live without a model suffix.
pub const HISTORICAL_DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Kind of artifact stored per fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Prompt,
    Result,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Prompt => "prompt",
            ArtifactKind::Result => "result",
        }
    }

    /// File name for the artifact of fixture `sequence`.
    pub fn file_name(&self, sequence: u32) -> String {
        match self {
            ArtifactKind::Prompt => format!("{sequence}-prompt.txt"),
            ArtifactKind::Result => format!("{sequence}-result.json"),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed storage for prompt and result artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether the artifact exists.
    async fn exists(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<bool, StoreError>;

    /// Writes the artifact, replacing any previous content.
    async fn write(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
        contents: &str,
    ) -> Result<(), StoreError>;

    /// Reads the artifact.
    ///
    /// Returns [`StoreError::NotFound`] if it has never been written.
    async fn read(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, StoreError>;
}

/// Suffix appended to the results root for a non-default model.
///
/// Path separators in the model name become `_`.
pub fn model_suffix(model: Option<&str>) -> String {
    match model {
        None => String::new(),
        Some(m) if m.is_empty() || is_historical_default(m) => String::new(),
        Some(m) => format!("-{}", m.replace(['/', '\\'], "_")),
    }
}

fn is_historical_default(model: &str) -> bool {
    model == HISTORICAL_DEFAULT_MODEL
        || model.strip_prefix("openai/") == Some(HISTORICAL_DEFAULT_MODEL)
}

/// Directory holding the artifact set for a rubric and model.
///
/// `./results` with the extended rubric and model `openai/gpt-4o` becomes
/// `./results-more-complex-openai_gpt-4o`.
pub fn layout_root(root: &Path, rubric: &RubricConfig, model: Option<&str>) -> PathBuf {
    let suffix = format!("{}{}", rubric.variant_suffix(), model_suffix(model));
    if suffix.is_empty() {
        return root.to_path_buf();
    }
    let trimmed = root.components().as_path();
    let mut name = trimmed.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Filesystem artifact store.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Creates a store rooted at an already-resolved layout root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store for the given results root, rubric and model.
    pub fn for_layout(root: &Path, rubric: &RubricConfig, model: Option<&str>) -> Self {
        Self::new(layout_root(root, rubric, model))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one condition.
    pub fn condition_dir(&self, condition: Condition) -> PathBuf {
        self.root.join(condition.as_str())
    }

    /// Full path of an artifact.
    pub fn artifact_path(&self, condition: Condition, sequence: u32, kind: ArtifactKind) -> PathBuf {
        self.condition_dir(condition).join(kind.file_name(sequence))
    }

    async fn ensure_condition_dir(&self, condition: Condition) -> Result<(), StoreError> {
        let dir = self.condition_dir(condition);
        fs::create_dir_all(&dir).await.map_err(|e| {
            StoreError::DirectoryCreationFailed(format!(
                "Failed to create directory {:?}: {}",
                dir, e
            ))
        })
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<bool, StoreError> {
        let path = self.artifact_path(condition, sequence, kind);
        Ok(fs::try_exists(&path).await?)
    }

    async fn write(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
        contents: &str,
    ) -> Result<(), StoreError> {
        self.ensure_condition_dir(condition).await?;
        let path = self.artifact_path(condition, sequence, kind);
        fs::write(&path, contents).await?;
        Ok(())
    }

    async fn read(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, StoreError> {
        let path = self.artifact_path(condition, sequence, kind);
        fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    condition,
                    sequence,
                    kind: kind.as_str(),
                }
            } else {
                StoreError::Io(e)
            }
        })
    }
}

type ArtifactKey = (Condition, u32, ArtifactKind);

/// In-memory artifact store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<ArtifactKey, String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts of `kind` across both conditions.
    pub async fn count(&self, kind: ArtifactKind) -> usize {
        self.artifacts
            .lock()
            .await
            .keys()
            .filter(|(_, _, k)| *k == kind)
            .count()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn exists(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<bool, StoreError> {
        Ok(self
            .artifacts
            .lock()
            .await
            .contains_key(&(condition, sequence, kind)))
    }

    async fn write(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
        contents: &str,
    ) -> Result<(), StoreError> {
        self.artifacts
            .lock()
            .await
            .insert((condition, sequence, kind), contents.to_string());
        Ok(())
    }

    async fn read(
        &self,
        condition: Condition,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, StoreError> {
        self.artifacts
            .lock()
            .await
            .get(&(condition, sequence, kind))
            .cloned()
            .ok_or(StoreError::NotFound {
                condition,
                sequence,
                kind: kind.as_str(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_names() {
        assert_eq!(ArtifactKind::Prompt.file_name(12), "12-prompt.txt");
        assert_eq!(ArtifactKind::Result.file_name(1), "1-result.json");
    }

    #[test]
    fn test_model_suffix() {
        assert_eq!(model_suffix(None), "");
        assert_eq!(model_suffix(Some("")), "");
        assert_eq!(model_suffix(Some("gpt-4-turbo")), "");
        assert_eq!(model_suffix(Some("openai/gpt-4-turbo")), "");
        assert_eq!(model_suffix(Some("gpt-4o")), "-gpt-4o");
        assert_eq!(model_suffix(Some("openai/gpt-4o")), "-openai_gpt-4o");
    }

    #[test]
    fn test_layout_root() {
        let root = Path::new("./results");
        assert_eq!(
            layout_root(root, &RubricConfig::basic(), None),
            PathBuf::from("./results")
        );
        assert_eq!(
            layout_root(root, &RubricConfig::extended(), None),
            PathBuf::from("./results-more-complex")
        );
        assert_eq!(
            layout_root(root, &RubricConfig::basic(), Some("gpt-4o")),
            PathBuf::from("./results-gpt-4o")
        );
        assert_eq!(
            layout_root(root, &RubricConfig::extended(), Some("openai/gpt-4o")),
            PathBuf::from("./results-more-complex-openai_gpt-4o")
        );
    }

    #[test]
    fn test_artifact_paths() {
        let store = FsArtifactStore::new("results");
        assert_eq!(
            store.artifact_path(Condition::Polite, 3, ArtifactKind::Prompt),
            PathBuf::from("results/polite/3-prompt.txt")
        );
        assert_eq!(
            store.artifact_path(Condition::Impolite, 3, ArtifactKind::Result),
            PathBuf::from("results/impolite/3-result.json")
        );
    }

    #[tokio::test]
    async fn test_fs_store_write_read_exists() {
        let dir = TempDir::new().expect("tempdir");
        let store = FsArtifactStore::new(dir.path().join("results"));

        assert!(!store
            .exists(Condition::Polite, 1, ArtifactKind::Prompt)
            .await
            .expect("exists"));

        store
            .write(Condition::Polite, 1, ArtifactKind::Prompt, "Please come up")
            .await
            .expect("write");

        assert!(store
            .exists(Condition::Polite, 1, ArtifactKind::Prompt)
            .await
            .expect("exists"));
        assert!(!store
            .exists(Condition::Impolite, 1, ArtifactKind::Prompt)
            .await
            .expect("exists"));
        assert_eq!(
            store
                .read(Condition::Polite, 1, ArtifactKind::Prompt)
                .await
                .expect("read"),
            "Please come up"
        );
        assert!(dir.path().join("results/polite/1-prompt.txt").is_file());
    }

    #[tokio::test]
    async fn test_fs_store_read_missing() {
        let dir = TempDir::new().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());

        let err = store
            .read(Condition::Impolite, 9, ArtifactKind::Result)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                condition: Condition::Impolite,
                sequence: 9,
                kind: "result"
            }
        ));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryArtifactStore::new();
        store
            .write(Condition::Impolite, 2, ArtifactKind::Result, "{}")
            .await
            .expect("write");

        assert!(store
            .exists(Condition::Impolite, 2, ArtifactKind::Result)
            .await
            .expect("exists"));
        assert!(!store
            .exists(Condition::Polite, 2, ArtifactKind::Result)
            .await
            .expect("exists"));
        assert_eq!(store.count(ArtifactKind::Result).await, 1);
        assert_eq!(store.count(ArtifactKind::Prompt).await, 0);
        assert!(store
            .read(Condition::Polite, 2, ArtifactKind::Result)
            .await
            .is_err());
    }
}
