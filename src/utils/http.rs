// src/utils/http.rs

//! HTTP client utilities.

use reqwest::redirect::Policy;

use crate::error::Result;
use crate::models::PortalConfig;

/// Maximum redirects followed per request; portal logins bounce through a
/// few hops.
const MAX_REDIRECTS: usize = 10;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &PortalConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()?;
    Ok(client)
}
