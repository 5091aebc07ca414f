//! Storage abstractions for collection results.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── stats/                # One snapshot per term (overwritten per run)
//! │   ├── 202401.json
//! │   ├── 202401.rejected.json   # Last run the guard refused, if any
//! │   └── 202403.json
//! └── exports/              # Raw CSV exports (never overwritten)
//!     └── course-stats-20240115T093000Z.csv
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CollectionReport, Term};

// Re-export for convenience
pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Where the data landed
    pub location: String,
    /// Number of records written (bytes for exports)
    pub count: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for result storage backends.
#[async_trait]
pub trait StatsStorage: Send + Sync {
    /// Replace the snapshot for the report's term.
    async fn write_report(&self, report: &CollectionReport) -> Result<WriteMetadata>;

    /// Load the snapshot for a term, if one exists.
    async fn load_report(&self, term: &Term) -> Result<Option<CollectionReport>>;

    /// Keep a report the completeness guard refused, next to the snapshot it
    /// would have replaced. Overwrites any earlier refused report.
    async fn write_rejected(&self, report: &CollectionReport) -> Result<WriteMetadata>;

    /// Store a raw CSV export under a fresh name.
    async fn write_export(&self, bytes: &[u8]) -> Result<WriteMetadata>;
}
