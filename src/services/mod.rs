//! Service layer for the collector.
//!
//! This module contains the business logic for:
//! - Portal transport (`Portal`, `HttpPortal`)
//! - Page parsing (`PageParser`)
//! - Bounded retries (`retry_until_found`, `Backoff`)
//! - Statistics collection (`CourseStatsCollector`)

mod collector;
pub mod parse;
mod portal;
pub mod retry;

pub use collector::CourseStatsCollector;
pub use parse::{PageParser, ParsedTable};
pub use portal::{HttpPortal, Portal};
pub use retry::{Attempted, Backoff, retry_until_found};
