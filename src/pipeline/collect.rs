// src/pipeline/collect.rs

//! Statistics collection pipeline.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{CollectionReport, Config, SessionCredential};
use crate::pipeline::CompletenessGuard;
use crate::services::{CourseStatsCollector, Portal};
use crate::storage::{StatsStorage, WriteMetadata};
use crate::utils::log as console;

/// Options for a single collection run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Write even if the snapshot guard objects
    pub force: bool,
    /// Print every record to stdout
    pub print_records: bool,
}

/// Collect statistics for `term` over HTTP and store the snapshot.
pub async fn run_collect(
    config: Arc<Config>,
    credential: &SessionCredential,
    storage: &dyn StatsStorage,
    term: &str,
    options: CollectOptions,
) -> Result<CollectionReport> {
    let collector = CourseStatsCollector::connect(Arc::clone(&config), credential)?;
    collect_with(&collector, &config, storage, term, options).await
}

/// Run a collection with an already constructed collector.
pub async fn collect_with<P: Portal>(
    collector: &CourseStatsCollector<P>,
    config: &Config,
    storage: &dyn StatsStorage,
    term: &str,
    options: CollectOptions,
) -> Result<CollectionReport> {
    console::header(&format!("Collecting course statistics for term {term}"));

    console::step(1, 2, "Fetching subjects and results tables");
    let report = collector.collect(term).await?;

    if options.print_records {
        for record in report.records() {
            println!("{}\t{}", record.order_key, record.enrollment);
        }
    }

    console::step(2, 2, "Writing snapshot");
    let previous = storage.load_report(&report.term).await?;
    if options.force {
        log::warn!("Snapshot guard bypassed (--force)");
    } else if let Err(refused) =
        CompletenessGuard::new(config.storage.guard.clone()).validate(&report, previous.as_ref())
    {
        let kept = storage.write_rejected(&report).await?;
        log::warn!(
            "Refused report kept at {}; rerun with --force to replace the snapshot",
            kept.location
        );
        return Err(refused);
    }
    let written = storage.write_report(&report).await?;

    print_summary(&report, &written);
    Ok(report)
}

fn print_summary(report: &CollectionReport, written: &WriteMetadata) {
    let elapsed = report.finished_at - report.started_at;
    console::summary(
        "Collection Results",
        &[
            ("Term", report.term.to_string()),
            ("Subjects", report.subjects.len().to_string()),
            ("Completed", report.completed_count().to_string()),
            ("Skipped", report.skipped().count().to_string()),
            ("Records", report.record_count().to_string()),
            ("Malformed rows", report.malformed_rows().to_string()),
            ("Table requests", report.total_attempts().to_string()),
            ("Elapsed", format!("{}s", elapsed.num_seconds())),
            ("Snapshot", written.location.clone()),
        ],
    );

    for skipped in report.skipped() {
        if let crate::models::SubjectOutcome::Skipped { reason } = &skipped.outcome {
            console::warn_item(&format!(
                "{} skipped after {} attempts: {}",
                skipped.subject, skipped.attempts, reason
            ));
        }
    }

    if report.is_complete() {
        console::success("All subjects collected");
    }
}
