//! Academic term identifiers.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Oldest term the statistics portal reports on.
pub const MIN_TERM: &str = "202103";

/// Four-digit year followed by a two-digit season marker.
const TERM_PATTERN: &str = r"^\d{4}\d{2}$";

/// A six-digit term code: four-digit year followed by a season marker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    /// Parse a term code, rejecting malformed codes and codes older than
    /// `min_term`. Ordering is plain string ordering, matching the portal.
    ///
    /// The code must be exactly six ASCII digits after trimming, so a string
    /// such as `"2024ab"` is rejected even though it sorts after `min_term`.
    pub fn parse(raw: &str, min_term: &str) -> Result<Self> {
        let code = raw.trim();
        let pattern = Regex::new(TERM_PATTERN).map_err(|e| AppError::config(e.to_string()))?;
        if !pattern.is_match(code) {
            return Err(AppError::validation(format!(
                "term '{code}' must be six digits (YYYY + season, e.g. 202401)"
            )));
        }
        if code < min_term {
            return Err(AppError::validation(format!(
                "term '{code}' precedes the oldest supported term {min_term}"
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Four-digit year prefix.
    pub fn year(&self) -> &str {
        &self.0[..4]
    }

    /// Season marker suffix.
    pub fn season(&self) -> &str {
        &self.0[4..]
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
