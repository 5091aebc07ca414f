// src/models/mod.rs

//! Domain models for the collector.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod credential;
mod selectors;
mod stats;
mod term;

// Re-export all public types
pub use config::{
    CollectorConfig, Config, GuardConfig, LoggingConfig, PortalConfig, RetryConfig, StorageConfig,
};
pub use credential::SessionCredential;
pub use selectors::PortalSelectors;
pub use stats::{CollectionReport, CourseStat, SkipReason, SubjectOutcome, SubjectReport};
pub use term::{MIN_TERM, Term};
