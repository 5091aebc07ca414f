// src/services/retry.rs

//! Bounded retries with exponential backoff.
//!
//! An operation yields `Ok(Some(value))` when it got what it wanted,
//! `Ok(None)` when the response arrived without the expected content, or an
//! error. Absent content and retryable errors both consume an attempt;
//! anything else stops the loop immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::RetryConfig;

/// Exponential delay schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Backoff {
    /// No delay between attempts.
    pub const NONE: Backoff = Backoff {
        initial: Duration::ZERO,
        multiplier: 1.0,
        max: Duration::ZERO,
    };

    /// Delay after `failed_attempt` (1-based) has failed.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = (self.initial.as_secs_f64() * self.multiplier.powi(exponent)).max(0.0);
        if !scaled.is_finite() || scaled >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(scaled)
    }
}

impl From<&RetryConfig> for Backoff {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier,
            max: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// How a bounded attempt loop ended.
#[derive(Debug)]
pub enum Attempted<T> {
    Found {
        value: T,
        attempts: u32,
    },
    /// `last_error` is `None` when the final attempt got a response
    /// without the expected content.
    Exhausted {
        attempts: u32,
        last_error: Option<AppError>,
    },
}

impl<T> Attempted<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Attempted::Found { attempts, .. } | Attempted::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `op` up to `max_attempts` times, sleeping per `backoff` between tries.
///
/// Non-retryable errors are returned as `Err` without further attempts.
pub async fn retry_until_found<T, F, Fut>(
    max_attempts: u32,
    backoff: Backoff,
    label: &str,
    mut op: F,
) -> Result<Attempted<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(Some(value)) => {
                if attempt > 1 {
                    log::debug!("{label}: succeeded on attempt {attempt}/{max_attempts}");
                }
                return Ok(Attempted::Found {
                    value,
                    attempts: attempt,
                });
            }
            Ok(None) => {
                log::debug!("{label}: expected content missing (attempt {attempt}/{max_attempts})");
                last_error = None;
            }
            Err(e) if e.is_retryable() => {
                log::debug!("{label}: attempt {attempt}/{max_attempts} failed: {e}");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }

        if attempt < max_attempts {
            let delay = backoff.delay_after(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    Ok(Attempted::Exhausted {
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn delay_grows_and_caps() {
        let backoff = Backoff {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max: Duration::from_secs(8),
        };
        assert_eq!(backoff.delay_after(1), Duration::from_millis(500));
        assert_eq!(backoff.delay_after(2), Duration::from_secs(1));
        assert_eq!(backoff.delay_after(4), Duration::from_secs(4));
        assert_eq!(backoff.delay_after(5), Duration::from_secs(8));
        assert_eq!(backoff.delay_after(60), Duration::from_secs(8));
    }

    #[test]
    fn backoff_from_default_config() {
        let backoff = Backoff::from(&RetryConfig::default());
        assert_eq!(backoff.initial, Duration::from_millis(500));
        assert_eq!(backoff.max, Duration::from_secs(8));
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = Cell::new(0);
        let result = retry_until_found(10, Backoff::NONE, "test", |attempt| {
            calls.set(calls.get() + 1);
            async move { Ok(if attempt == 4 { Some("table") } else { None }) }
        })
        .await
        .unwrap();

        assert!(matches!(result, Attempted::Found { value: "table", attempts: 4 }));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn exhausts_after_bound() {
        let calls = Cell::new(0);
        let result: Attempted<()> = retry_until_found(10, Backoff::NONE, "test", |_| {
            calls.set(calls.get() + 1);
            async { Ok(None) }
        })
        .await
        .unwrap();

        assert!(matches!(
            result,
            Attempted::Exhausted {
                attempts: 10,
                last_error: None
            }
        ));
        assert_eq!(calls.get(), 10);
    }

    #[tokio::test]
    async fn keeps_last_transport_error() {
        let result: Attempted<()> = retry_until_found(3, Backoff::NONE, "test", |attempt| async move {
            Err(AppError::transport(format!("refused #{attempt}")))
        })
        .await
        .unwrap();

        match result {
            Attempted::Exhausted {
                attempts,
                last_error: Some(AppError::Transport(message)),
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(message, "refused #3");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminal_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<Attempted<()>> = retry_until_found(10, Backoff::NONE, "test", |_| {
            calls.set(calls.get() + 1);
            async { Err(AppError::config("broken")) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Config(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_bound_still_tries_once() {
        let result = retry_until_found(0, Backoff::NONE, "test", |_| async { Ok(Some(1)) })
            .await
            .unwrap();
        assert_eq!(result.attempts(), 1);
    }
}
