//! Checkpoint storage for per-source watermarks.
//!
//! Each source has one durable record holding the `modified` watermark of
//! the most recently acknowledged document. A source that has never run has
//! no record; `get` signals that with a distinct `NotFound` rather than a
//! silent zero value, and the orchestrator seeds the configured start
//! watermark before the first cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use movies_etl_shared::{Source, Watermark};

/// Errors that can occur reading or writing checkpoints.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint has been recorded for this source yet.
    #[error("No checkpoint recorded for source '{0}'")]
    NotFound(Source),

    /// Underlying storage failed.
    #[error("Checkpoint io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be parsed or written.
    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The persisted record layout: `{ "modified": <ISO-8601 with offset> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointRecord {
    modified: Watermark,
}

/// Durable store of per-source watermarks.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the watermark recorded for a source.
    async fn get(&self, source: Source) -> Result<Watermark, CheckpointError>;

    /// Record a new watermark for a source.
    async fn set(&self, source: Source, watermark: Watermark) -> Result<(), CheckpointError>;
}

/// File-backed checkpoint store, one JSON file per source.
///
/// Writes go to a temporary sibling which is then renamed over the record,
/// so an interrupt mid-write never leaves a torn checkpoint behind.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, source: Source) -> PathBuf {
        self.dir.join(format!("{}.json", source.table()))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn get(&self, source: Source) -> Result<Watermark, CheckpointError> {
        let path = self.record_path(source);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(source));
            }
            Err(e) => return Err(e.into()),
        };

        let record: CheckpointRecord = serde_json::from_str(&raw)?;
        Ok(record.modified)
    }

    async fn set(&self, source: Source, watermark: Watermark) -> Result<(), CheckpointError> {
        let path = self.record_path(source);
        let tmp = tmp_path(&path);

        let body = serde_json::to_vec_pretty(&CheckpointRecord {
            modified: watermark,
        })?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(source = %source, watermark = %watermark, "Persisted checkpoint");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// In-memory checkpoint store for tests and local experiments.
pub struct MemoryCheckpointStore {
    records: Mutex<HashMap<Source, Watermark>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, source: Source) -> Result<Watermark, CheckpointError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&source)
            .copied()
            .ok_or(CheckpointError::NotFound(source))
    }

    async fn set(&self, source: Source, watermark: Watermark) -> Result<(), CheckpointError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source, watermark);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watermark(s: &str) -> Watermark {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_get_before_set_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();

        let err = store.get(Source::FilmWork).await.unwrap_err();
        assert!(matches!(err, CheckpointError::NotFound(Source::FilmWork)));
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let wm = watermark("2020-06-16T23:14:09.320625+03:00");

        store.set(Source::Genre, wm).await.unwrap();
        assert_eq!(store.get(Source::Genre).await.unwrap(), wm);
    }

    #[tokio::test]
    async fn test_record_layout_is_modified_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let wm = watermark("2021-01-01T00:00:00+00:00");

        store.set(Source::Person, wm).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("person.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["modified"].is_string());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();

        store
            .set(Source::FilmWork, watermark("2021-01-01T00:00:00+00:00"))
            .await
            .unwrap();
        store
            .set(Source::FilmWork, watermark("2021-01-02T00:00:00+00:00"))
            .await
            .unwrap();

        assert_eq!(
            store.get(Source::FilmWork).await.unwrap(),
            watermark("2021-01-02T00:00:00+00:00")
        );
        assert!(!dir.path().join("film_work.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_sources_are_independent() {
        let store = MemoryCheckpointStore::new();
        let wm = watermark("2021-05-05T12:00:00+03:00");

        store.set(Source::FilmWork, wm).await.unwrap();

        assert!(matches!(
            store.get(Source::Genre).await,
            Err(CheckpointError::NotFound(Source::Genre))
        ));
        assert_eq!(store.get(Source::FilmWork).await.unwrap(), wm);
    }
}
