//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── stats/
//! │   ├── {term}.json            # Full CollectionReport, pretty JSON
//! │   └── {term}.rejected.json   # Report refused by the completeness guard
//! └── exports/
//!     └── course-stats-{timestamp}.csv
//! ```
//!
//! Writes go to a temporary file that is renamed into place, so a crash never
//! leaves a half-written snapshot behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CollectionReport, Term};
use crate::storage::{StatsStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn report_key(term: &Term) -> String {
        format!("stats/{}.json", term)
    }

    fn rejected_key(term: &Term) -> String {
        format!("stats/{}.rejected.json", term)
    }

    fn export_key() -> String {
        format!(
            "exports/course-stats-{}.csv",
            Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        )
    }
}

#[async_trait]
impl StatsStorage for LocalStorage {
    async fn write_report(&self, report: &CollectionReport) -> Result<WriteMetadata> {
        let key = Self::report_key(&report.term);
        let path = self.write_json(&key, report).await?;
        log::info!(
            "Snapshot: {} records for term {} written to {}",
            report.record_count(),
            report.term,
            path.display()
        );
        Ok(WriteMetadata {
            location: path.display().to_string(),
            count: report.record_count(),
            timestamp: Utc::now(),
        })
    }

    async fn load_report(&self, term: &Term) -> Result<Option<CollectionReport>> {
        let report = self.read_json(&Self::report_key(term)).await?;
        if report.is_none() {
            log::debug!("No previous snapshot for term {}", term);
        }
        Ok(report)
    }

    async fn write_rejected(&self, report: &CollectionReport) -> Result<WriteMetadata> {
        let path = self
            .write_json(&Self::rejected_key(&report.term), report)
            .await?;
        Ok(WriteMetadata {
            location: path.display().to_string(),
            count: report.record_count(),
            timestamp: Utc::now(),
        })
    }

    async fn write_export(&self, bytes: &[u8]) -> Result<WriteMetadata> {
        let path = self.write_bytes(&Self::export_key(), bytes).await?;
        Ok(WriteMetadata {
            location: path.display().to_string(),
            count: bytes.len(),
            timestamp: Utc::now(),
        })
    }
}
