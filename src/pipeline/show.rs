// src/pipeline/show.rs

use crate::error::{AppError, Result};
use crate::models::{Config, SubjectOutcome, Term};
use crate::storage::StatsStorage;
use crate::utils::log as console;

/// Print a stored snapshot.
pub async fn run_show(config: &Config, storage: &dyn StatsStorage, term: &str) -> Result<()> {
    let term = Term::parse(term, &config.portal.min_term)?;
    let report = storage
        .load_report(&term)
        .await?
        .ok_or_else(|| AppError::config(format!("No snapshot stored for term {term}")))?;

    console::header(&format!("Snapshot for term {term}"));
    console::sub_item(&format!(
        "Collected {} → {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));

    for subject in &report.subjects {
        match &subject.outcome {
            SubjectOutcome::Completed { records, .. } => console::sub_item(&format!(
                "{}: {} courses",
                subject.subject,
                records.len()
            )),
            SubjectOutcome::Skipped { reason } => {
                console::warn_item(&format!("{}: skipped ({})", subject.subject, reason))
            }
        }
    }

    for record in report.records() {
        println!("{}\t{}", record.order_key, record.enrollment);
    }

    console::success(&format!(
        "{} records across {} subjects",
        report.record_count(),
        report.completed_count()
    ));
    Ok(())
}
