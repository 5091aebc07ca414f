// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::PageParser;
use crate::utils::log as console;

/// Validate configuration values and selectors, then print the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    console::header("Validating configuration");

    config.validate()?;
    PageParser::new(&config.portal.selectors)?;

    console::success("Configuration OK");
    console::sub_item(&format!("Portal: {}", config.portal.base_url));
    console::sub_item(&format!("Timeout: {}s", config.portal.timeout_secs));
    console::sub_item(&format!("Oldest term: {}", config.portal.min_term));
    console::sub_item(&format!(
        "Attempts: {} per subject, {} for discovery, {} for export",
        config.retry.table_attempts, config.retry.discovery_attempts, config.retry.export_attempts
    ));
    console::sub_item(&format!(
        "Backoff: {}ms ×{} up to {}ms",
        config.retry.initial_backoff_ms, config.retry.backoff_multiplier, config.retry.max_backoff_ms
    ));
    console::sub_item(&format!(
        "Concurrent subjects: {}",
        config.collector.max_concurrent
    ));
    console::sub_item(&format!("Storage: {}", config.storage.dir.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn default_config_validates() {
        assert!(run_validate(&Config::default()).is_ok());
    }

    #[test]
    fn invalid_selector_fails_validation() {
        let mut config = Config::default();
        config.portal.selectors.row = "tr[[".to_string();
        assert!(matches!(
            run_validate(&config),
            Err(AppError::Selector { .. })
        ));
    }
}
