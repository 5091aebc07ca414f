//! Pipeline entry points for collector operations.
//!
//! - `run_collect`: Collect one term's statistics and store the snapshot
//! - `run_download`: Fetch the portal's CSV export
//! - `run_show`: Print a stored snapshot
//! - `run_validate`: Check configuration

pub mod collect;
pub mod download;
pub mod guard;
pub mod show;
pub mod validate;

pub use collect::{CollectOptions, collect_with, run_collect};
pub use download::run_download;
pub use guard::{CompletenessGuard, GuardVerdict};
pub use show::run_show;
pub use validate::run_validate;
