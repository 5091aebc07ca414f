//! course-stats CLI
//!
//! Collects per-course enrollment statistics from the statistics portal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use course_stats::{
    config::{load_config, resolve_credential},
    error::Result,
    pipeline::{self, CollectOptions},
    services::HttpPortal,
    storage::LocalStorage,
    utils::log as console,
};

/// course-stats - Course Enrollment Statistics Collector
#[derive(Parser, Debug)]
#[command(
    name = "course-stats",
    version,
    about = "Collects per-course enrollment statistics from the statistics portal"
)]
struct Cli {
    /// Path to the configuration file (defaults are used when missing)
    #[arg(short, long, global = true, default_value = "data/config.toml")]
    config: PathBuf,

    /// Override the storage directory from the configuration
    #[arg(short, long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect statistics for every subject in a term
    Collect {
        /// Six-digit term code, e.g. 202401
        term: String,

        /// Session cookie value (falls back to $COURSE_STATS_SESSION, then a prompt)
        #[arg(long)]
        session: Option<String>,

        /// Overwrite the stored snapshot even if it would shrink sharply
        #[arg(long)]
        force: bool,

        /// Print each record as `order_key<TAB>enrollment`
        #[arg(long)]
        print: bool,
    },

    /// Download the portal's full CSV export
    Download {
        /// Session cookie value (falls back to $COURSE_STATS_SESSION, then a prompt)
        #[arg(long)]
        session: Option<String>,
    },

    /// Print the stored snapshot for a term
    Show {
        /// Six-digit term code, e.g. 202401
        term: String,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
///
/// Dependencies stay at `warn`; this crate's level is narrowed again once the
/// configuration is known. An explicit `RUST_LOG` always wins.
fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,course_stats=trace"),
    )
    .format_timestamp_secs()
    .init();
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }
}

/// Apply the level named in the configuration (or `debug` with `-v`).
fn apply_log_level(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    console::init(level);
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(level.parse().unwrap_or(log::LevelFilter::Info));
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config, cli.storage_dir.clone())?;
    apply_log_level(cli.verbose, &config.logging.level);
    log::debug!("Loaded configuration from {}", cli.config.display());

    let config = Arc::new(config);
    let storage = LocalStorage::new(&config.storage.dir);

    match cli.command {
        Command::Collect {
            term,
            session,
            force,
            print,
        } => {
            let credential = resolve_credential(session)?;
            let options = CollectOptions {
                force,
                print_records: print,
            };
            let report = pipeline::run_collect(
                Arc::clone(&config),
                &credential,
                &storage,
                &term,
                options,
            )
            .await?;

            if !report.is_complete() {
                log::warn!(
                    "{} of {} subjects were skipped; rerun to fill the gaps",
                    report.skipped().count(),
                    report.subjects.len()
                );
            }
        }

        Command::Download { session } => {
            let credential = resolve_credential(session)?;
            let portal = HttpPortal::new(&config.portal, &credential)?;
            pipeline::run_download(&config, &portal, &storage).await?;
        }

        Command::Show { term } => {
            pipeline::run_show(&config, &storage, &term).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "course-stats",
            "collect",
            "202401",
            "--config",
            "custom.toml",
            "--storage-dir",
            "out",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.storage_dir, Some(PathBuf::from("out")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Collect { ref term, .. } if term == "202401"));
    }

    #[test]
    fn config_defaults_when_not_given() {
        let cli = Cli::try_parse_from(["course-stats", "validate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("data/config.toml"));
        assert!(cli.storage_dir.is_none());
    }
}
