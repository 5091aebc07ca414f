//! Course statistic records and per-run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Term;

/// One row of a subject's results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStat {
    /// Sort key taken from the row's first cell
    pub order_key: String,

    /// Enrollment cell text with surrounding whitespace removed; otherwise
    /// kept verbatim (no comma stripping or numeric parsing, see
    /// [`CourseStat::enrollment_count`])
    pub enrollment: String,
}

impl CourseStat {
    pub fn new(order_key: impl Into<String>, enrollment: impl Into<String>) -> Self {
        Self {
            order_key: order_key.into(),
            enrollment: enrollment.into(),
        }
    }

    /// Enrollment as a number, when the cell holds one.
    pub fn enrollment_count(&self) -> Option<u32> {
        self.enrollment.replace(',', "").parse().ok()
    }
}

/// Why a subject contributed nothing to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Every response arrived but none contained the results table
    TableNotFound,
    /// The final attempt failed at the transport level
    Transport(String),
    /// The final attempt timed out
    Timeout(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TableNotFound => write!(f, "results table never appeared"),
            SkipReason::Transport(message) => write!(f, "transport failure: {message}"),
            SkipReason::Timeout(message) => write!(f, "timed out: {message}"),
        }
    }
}

/// Result of processing one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubjectOutcome {
    /// The table was found. An empty `records` means the subject has no
    /// courses for the term.
    Completed {
        records: Vec<CourseStat>,
        #[serde(default)]
        malformed_rows: usize,
    },
    /// The attempt bound ran out.
    Skipped { reason: SkipReason },
}

/// Outcome of one subject together with how many requests it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject: String,
    pub attempts: u32,
    pub outcome: SubjectOutcome,
}

impl SubjectReport {
    pub fn records(&self) -> &[CourseStat] {
        match &self.outcome {
            SubjectOutcome::Completed { records, .. } => records,
            SubjectOutcome::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, SubjectOutcome::Skipped { .. })
    }
}

/// Everything one collection run produced, in subject discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub term: Term,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub subjects: Vec<SubjectReport>,
}

impl CollectionReport {
    /// All records, subject by subject, rows in table order.
    pub fn records(&self) -> impl Iterator<Item = &CourseStat> {
        self.subjects.iter().flat_map(|s| s.records().iter())
    }

    pub fn into_records(self) -> Vec<CourseStat> {
        self.subjects
            .into_iter()
            .flat_map(|s| match s.outcome {
                SubjectOutcome::Completed { records, .. } => records,
                SubjectOutcome::Skipped { .. } => Vec::new(),
            })
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.subjects.iter().map(|s| s.records().len()).sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SubjectReport> {
        self.subjects.iter().filter(|s| s.is_skipped())
    }

    pub fn completed_count(&self) -> usize {
        self.subjects.len() - self.skipped().count()
    }

    pub fn malformed_rows(&self) -> usize {
        self.subjects
            .iter()
            .map(|s| match s.outcome {
                SubjectOutcome::Completed { malformed_rows, .. } => malformed_rows,
                SubjectOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// True when every subject yielded a table.
    pub fn is_complete(&self) -> bool {
        self.skipped().next().is_none()
    }

    /// Total requests issued for results tables.
    pub fn total_attempts(&self) -> u32 {
        self.subjects.iter().map(|s| s.attempts).sum()
    }
}
