//! Session credential for the statistics portal.

use std::fmt;

use crate::error::{AppError, Result};

/// Opaque session cookie value obtained from an interactive login.
///
/// Never mutated after construction and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(AppError::validation("session credential is empty"));
        }
        if value.contains([';', '\r', '\n']) {
            return Err(AppError::validation(
                "session credential must be a bare cookie value",
            ));
        }
        Ok(Self(value))
    }

    /// `Cookie` header value, e.g. `JSESSIONID=abc123`.
    pub fn cookie_header(&self, cookie_name: &str) -> String {
        format!("{}={}", cookie_name, self.0)
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCredential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_cookie_header() {
        let credential = SessionCredential::new(" abc123 ").unwrap();
        assert_eq!(credential.cookie_header("JSESSIONID"), "JSESSIONID=abc123");
    }

    #[test]
    fn debug_output_is_redacted() {
        let credential = SessionCredential::new("secret-token").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn rejects_empty_and_compound_values() {
        assert!(SessionCredential::new("   ").is_err());
        assert!(SessionCredential::new("abc; other=1").is_err());
        assert!(SessionCredential::new("abc\r\nX-Injected: 1").is_err());
    }
}
