// src/config.rs

//! Configuration and credential loading utilities.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{Config, SessionCredential};

/// Environment variable consulted when no session is passed explicitly.
pub const SESSION_ENV: &str = "COURSE_STATS_SESSION";

/// Load configuration, falling back to defaults when the file is missing,
/// and apply a storage override.
pub fn load_config(path: &Path, storage_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    if let Some(dir) = storage_dir {
        config.storage.dir = dir;
    }
    config.validate()?;
    Ok(config)
}

/// Resolve the session credential from an explicit value, the environment,
/// or an interactive prompt, in that order.
pub fn resolve_credential(explicit: Option<String>) -> Result<SessionCredential> {
    resolve_credential_from(explicit, std::env::var(SESSION_ENV).ok(), || {
        prompt_line("Enter session cookie: ")
    })
}

fn resolve_credential_from(
    explicit: Option<String>,
    env_value: Option<String>,
    prompt: impl FnOnce() -> Result<String>,
) -> Result<SessionCredential> {
    if let Some(value) = explicit {
        return SessionCredential::new(value);
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        log::debug!("Using session credential from ${SESSION_ENV}");
        return SessionCredential::new(value);
    }
    SessionCredential::new(prompt()?)
}

fn prompt_line(message: &str) -> Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(message.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(AppError::validation("no session credential provided"));
    }
    Ok(line)
}
