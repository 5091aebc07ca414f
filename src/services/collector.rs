// src/services/collector.rs

//! Course statistics collector.
//!
//! Discovers the portal's subject list, then requests each subject's results
//! table under an independent attempt bound and gathers the rows into one
//! [`CollectionReport`].

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    CollectionReport, Config, SessionCredential, SkipReason, SubjectOutcome, SubjectReport, Term,
};
use crate::services::parse::PageParser;
use crate::services::portal::{HttpPortal, Portal};
use crate::services::retry::{Attempted, Backoff, retry_until_found};

/// Collects per-course statistics for every subject in a term.
pub struct CourseStatsCollector<P> {
    portal: P,
    config: Arc<Config>,
    parser: PageParser,
    backoff: Backoff,
}

impl CourseStatsCollector<HttpPortal> {
    /// Collector talking to the configured portal with the given session.
    pub fn connect(config: Arc<Config>, credential: &SessionCredential) -> Result<Self> {
        let portal = HttpPortal::new(&config.portal, credential)?;
        Self::new(portal, config)
    }
}

impl<P: Portal> CourseStatsCollector<P> {
    pub fn new(portal: P, config: Arc<Config>) -> Result<Self> {
        let parser = PageParser::new(&config.portal.selectors)?;
        let backoff = Backoff::from(&config.retry);
        Ok(Self {
            portal,
            config,
            parser,
            backoff,
        })
    }

    /// Replace the backoff schedule derived from the configuration.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    /// Collect statistics for `term`.
    ///
    /// Terms older than the configured minimum are rejected before any
    /// request is made. Subjects that never yield a table are reported as
    /// skipped rather than failing the run.
    pub async fn collect(&self, term: &str) -> Result<CollectionReport> {
        let term = Term::parse(term, &self.config.portal.min_term)?;
        let started_at = Utc::now();

        let subjects = self.discover_subjects().await?;
        log::info!("Discovered {} subjects for term {}", subjects.len(), term);

        let concurrency = self.config.collector.max_concurrent.max(1);
        let term_ref = &term;
        let reports: Vec<SubjectReport> = stream::iter(subjects)
            .map(|subject| async move { self.collect_subject(term_ref, subject).await })
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(CollectionReport {
            term,
            started_at,
            finished_at: Utc::now(),
            subjects: reports,
        })
    }

    /// Fetch the subject list, retrying until the selection control appears.
    pub async fn discover_subjects(&self) -> Result<Vec<String>> {
        let attempts = self.config.retry.discovery_attempts;
        let (portal, parser) = (&self.portal, &self.parser);
        let result = retry_until_found(attempts, self.backoff, "subject discovery", |_| async move {
            let html = portal.subject_page().await?;
            Ok::<_, AppError>(parser.subjects(&html))
        })
        .await?;

        match result {
            Attempted::Found { value, .. } => Ok(value),
            Attempted::Exhausted {
                attempts,
                last_error: Some(error),
            } => {
                log::error!("Subject discovery failed after {attempts} attempts: {error}");
                Err(error)
            }
            Attempted::Exhausted {
                attempts,
                last_error: None,
            } => Err(AppError::parse(format!(
                "subject control '{}' not found after {} attempts",
                self.config.portal.selectors.subject_select, attempts
            ))),
        }
    }

    /// Fetch one subject's table under the per-subject attempt bound.
    async fn collect_subject(&self, term: &Term, subject: String) -> Result<SubjectReport> {
        let attempts = self.config.retry.table_attempts;
        let label = format!("subject {subject}");
        let (portal, parser, code) = (&self.portal, &self.parser, subject.as_str());
        let result = retry_until_found(attempts, self.backoff, &label, |_| async move {
            let html = portal.results_page(term, code).await?;
            Ok::<_, AppError>(parser.course_table(&html))
        })
        .await?;

        let report = match result {
            Attempted::Found { value, attempts } => {
                if self.config.logging.show_progress {
                    log::info!(
                        "{}: {} courses ({} attempt{})",
                        subject,
                        value.records.len(),
                        attempts,
                        if attempts == 1 { "" } else { "s" }
                    );
                }
                if value.malformed_rows > 0 {
                    log::warn!("{}: {} malformed rows ignored", subject, value.malformed_rows);
                }
                SubjectReport {
                    subject,
                    attempts,
                    outcome: SubjectOutcome::Completed {
                        records: value.records,
                        malformed_rows: value.malformed_rows,
                    },
                }
            }
            Attempted::Exhausted {
                attempts,
                last_error,
            } => {
                let reason = match last_error {
                    None => SkipReason::TableNotFound,
                    Some(AppError::Timeout(message)) => SkipReason::Timeout(message),
                    Some(AppError::Transport(message)) => SkipReason::Transport(message),
                    Some(error) => SkipReason::Transport(error.to_string()),
                };
                log::warn!("{subject}: skipped after {attempts} attempts ({reason})");
                SubjectReport {
                    subject,
                    attempts,
                    outcome: SubjectOutcome::Skipped { reason },
                }
            }
        };
        Ok(report)
    }
}
