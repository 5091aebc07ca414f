//! Snapshot overwrite guard.
//!
//! A run where the portal flaked for many subjects produces a report that is
//! much smaller than the previous one for the same term. Writing it would
//! silently replace good data, so the write is refused when the record count
//! drops by more than `max_drop_percent`.

use crate::error::{AppError, Result};
use crate::models::{CollectionReport, GuardConfig};

/// Guard against replacing a snapshot with a noticeably smaller one.
#[derive(Debug, Clone)]
pub struct CompletenessGuard {
    config: GuardConfig,
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardVerdict {
    /// Safe to proceed with the write
    Safe {
        current_count: usize,
        previous_count: usize,
    },
    /// No previous snapshot, or one below the baseline
    ColdStart { current_count: usize },
    /// Too large a drop - abort write
    Triggered {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
    /// Nothing collected while the previous snapshot had data
    EmptyResult { previous_count: usize },
}

impl CompletenessGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Compare a new report with the previous snapshot for the same term.
    pub fn check(
        &self,
        current: &CollectionReport,
        previous: Option<&CollectionReport>,
    ) -> GuardVerdict {
        let current_count = current.record_count();
        let previous_count = previous.map_or(0, |p| p.record_count());

        if current_count == 0 && previous_count > 0 {
            return GuardVerdict::EmptyResult { previous_count };
        }

        if previous_count < self.config.min_baseline {
            return GuardVerdict::ColdStart { current_count };
        }

        if current_count < previous_count {
            let drop = previous_count - current_count;
            let drop_percent = (drop as f64 / previous_count as f64) * 100.0;

            if drop_percent > self.config.max_drop_percent as f64 {
                return GuardVerdict::Triggered {
                    current_count,
                    previous_count,
                    drop_percent,
                };
            }
        }

        GuardVerdict::Safe {
            current_count,
            previous_count,
        }
    }

    /// Return Ok if the write may proceed.
    pub fn validate(
        &self,
        current: &CollectionReport,
        previous: Option<&CollectionReport>,
    ) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        match self.check(current, previous) {
            GuardVerdict::Safe {
                current_count,
                previous_count,
            } => {
                log::info!(
                    "Snapshot guard: SAFE ({} records, was {})",
                    current_count,
                    previous_count
                );
                Ok(())
            }
            GuardVerdict::ColdStart { current_count } => {
                log::info!(
                    "Snapshot guard: COLD START ({} records, no usable previous snapshot)",
                    current_count
                );
                Ok(())
            }
            GuardVerdict::Triggered {
                current_count,
                previous_count,
                drop_percent,
            } => {
                log::error!(
                    "Snapshot guard: TRIGGERED! {} → {} records ({:.1}% drop > {}% threshold)",
                    previous_count,
                    current_count,
                    drop_percent,
                    self.config.max_drop_percent
                );
                Err(AppError::IncompleteRun {
                    current_count,
                    previous_count,
                    drop_percent,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
            GuardVerdict::EmptyResult { previous_count } => {
                log::error!("Snapshot guard: EMPTY RESULT - aborting write");
                Err(AppError::IncompleteRun {
                    current_count: 0,
                    previous_count,
                    drop_percent: 100.0,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
        }
    }
}

impl Default for CompletenessGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{CourseStat, MIN_TERM, SubjectOutcome, SubjectReport, Term};

    fn make_report(count: usize) -> CollectionReport {
        let now = Utc::now();
        CollectionReport {
            term: Term::parse("202401", MIN_TERM).unwrap(),
            started_at: now,
            finished_at: now,
            subjects: vec![SubjectReport {
                subject: "CPSC".into(),
                attempts: 1,
                outcome: SubjectOutcome::Completed {
                    records: (0..count)
                        .map(|i| CourseStat::new(i.to_string(), "10"))
                        .collect(),
                    malformed_rows: 0,
                },
            }],
        }
    }

    #[test]
    fn test_safe_no_drop() {
        let guard = CompletenessGuard::default();
        let verdict = guard.check(&make_report(100), Some(&make_report(100)));
        assert!(matches!(verdict, GuardVerdict::Safe { .. }));
    }

    #[test]
    fn test_safe_small_drop() {
        let guard = CompletenessGuard::default();
        let verdict = guard.check(&make_report(85), Some(&make_report(100)));
        assert!(matches!(verdict, GuardVerdict::Safe { .. }));
    }

    #[test]
    fn test_triggered_large_drop() {
        let guard = CompletenessGuard::default();
        let verdict = guard.check(&make_report(70), Some(&make_report(100)));
        assert!(matches!(verdict, GuardVerdict::Triggered { .. }));
    }

    #[test]
    fn test_cold_start() {
        let guard = CompletenessGuard::default();
        assert!(matches!(
            guard.check(&make_report(50), None),
            GuardVerdict::ColdStart { .. }
        ));
        assert!(matches!(
            guard.check(&make_report(1), Some(&make_report(5))),
            GuardVerdict::ColdStart { .. }
        ));
    }

    #[test]
    fn test_empty_result() {
        let guard = CompletenessGuard::default();
        assert!(matches!(
            guard.check(&make_report(0), Some(&make_report(3))),
            GuardVerdict::EmptyResult { previous_count: 3 }
        ));
    }

    #[test]
    fn test_validate_returns_error() {
        let guard = CompletenessGuard::default();
        let result = guard.validate(&make_report(50), Some(&make_report(100)));
        assert!(matches!(result, Err(AppError::IncompleteRun { .. })));
    }

    #[test]
    fn test_disabled_guard_allows_everything() {
        let guard = CompletenessGuard::new(GuardConfig {
            enabled: false,
            ..GuardConfig::default()
        });
        assert!(guard.validate(&make_report(0), Some(&make_report(100))).is_ok());
    }
}
