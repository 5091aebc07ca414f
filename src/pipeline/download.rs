// src/pipeline/download.rs

//! CSV export download.

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::{Attempted, Backoff, Portal, retry_until_found};
use crate::storage::{StatsStorage, WriteMetadata};
use crate::utils::log as console;

/// Download the portal's full CSV export and store it.
pub async fn run_download(
    config: &Config,
    portal: &dyn Portal,
    storage: &dyn StatsStorage,
) -> Result<WriteMetadata> {
    console::header("Downloading course statistics export");

    let backoff = Backoff::from(&config.retry);
    let attempts = config.retry.export_attempts;
    let result = retry_until_found(attempts, backoff, "csv export", |_| async move {
        let bytes = portal.export_csv().await?;
        Ok::<_, AppError>(Some(bytes))
    })
    .await?;

    let bytes = match result {
        Attempted::Found { value, .. } => value,
        Attempted::Exhausted {
            last_error: Some(error),
            ..
        } => return Err(error),
        Attempted::Exhausted { attempts, .. } => {
            return Err(AppError::transport(format!(
                "export unavailable after {attempts} attempts"
            )));
        }
    };

    if bytes.is_empty() {
        return Err(AppError::parse("portal returned an empty export"));
    }

    let written = storage.write_export(&bytes).await?;
    console::success(&format!(
        "Export saved: {} bytes to {}",
        written.count, written.location
    ));
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::{RetryConfig, Term};
    use crate::storage::LocalStorage;

    /// Export endpoint that fails a fixed number of times first.
    struct FlakyExport {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Portal for FlakyExport {
        async fn subject_page(&self) -> Result<String> {
            unreachable!()
        }

        async fn results_page(&self, _term: &Term, _subject: &str) -> Result<String> {
            unreachable!()
        }

        async fn export_csv(&self) -> Result<Vec<u8>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::transport("HTTP 502"))
            } else {
                Ok(b"course,enrolled\nCPSC 201,45\n".to_vec())
            }
        }
    }

    fn config() -> Config {
        Config {
            retry: RetryConfig {
                export_attempts: 3,
                initial_backoff_ms: 0,
                max_backoff_ms: 0,
                ..RetryConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn retries_then_saves_export() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let portal = FlakyExport {
            failures: 2,
            calls: AtomicUsize::new(0),
        };

        let written = run_download(&config(), &portal, &storage).await.unwrap();
        assert_eq!(portal.calls.load(Ordering::SeqCst), 3);
        assert!(written.location.ends_with(".csv"));
    }

    #[tokio::test]
    async fn surfaces_transport_error_after_bound() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let portal = FlakyExport {
            failures: 10,
            calls: AtomicUsize::new(0),
        };

        let err = run_download(&config(), &portal, &storage).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(portal.calls.load(Ordering::SeqCst), 3);
    }
}
