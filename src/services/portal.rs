// src/services/portal.rs

//! Statistics portal transport.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use url::Url;

use crate::error::Result;
use crate::models::{PortalConfig, SessionCredential, Term};
use crate::utils::http::create_async_client;

/// Requests the collector makes against the portal.
///
/// Implementations return the response body of a successful (2xx) response
/// and report everything else as an error.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Page carrying the subject selection control.
    async fn subject_page(&self) -> Result<String>;

    /// Results page for one subject in one term.
    async fn results_page(&self, term: &Term, subject: &str) -> Result<String>;

    /// Full statistics export as CSV bytes.
    async fn export_csv(&self) -> Result<Vec<u8>>;
}

/// Portal reached over HTTP with a session cookie.
pub struct HttpPortal {
    client: Client,
    base_url: Url,
    export_url: Url,
    cookie: String,
    stat_type: String,
    num_days: String,
}

impl HttpPortal {
    pub fn new(config: &PortalConfig, credential: &SessionCredential) -> Result<Self> {
        let client = create_async_client(config)?;
        Self::with_client(client, config, credential)
    }

    pub fn with_client(
        client: Client,
        config: &PortalConfig,
        credential: &SessionCredential,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let export_url = base_url.join(&config.export_path)?;
        Ok(Self {
            client,
            base_url,
            export_url,
            cookie: credential.cookie_header(&config.session_cookie),
            stat_type: config.stat_type.clone(),
            num_days: config.num_days.clone(),
        })
    }
}

#[async_trait]
impl Portal for HttpPortal {
    async fn subject_page(&self) -> Result<String> {
        let response = self
            .client
            .get(self.base_url.clone())
            .header(COOKIE, &self.cookie)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn results_page(&self, term: &Term, subject: &str) -> Result<String> {
        let form = [
            ("termCode", term.as_str()),
            ("subjectCode", subject),
            ("statType", self.stat_type.as_str()),
            ("numDays", self.num_days.as_str()),
        ];
        let response = self
            .client
            .post(self.base_url.clone())
            .header(COOKIE, &self.cookie)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn export_csv(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.export_url.clone())
            .header(COOKIE, &self.cookie)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
