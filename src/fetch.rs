use std::time::Duration;

use anyhow::Result;
use log::trace;
use url::Url;

use crate::error::ScrapeError;
use crate::settings::ScrapeSettings;

/// Source of pages and images.
pub trait Fetch {
    /// Fetch the body of `url` as text. Non-success statuses are errors.
    fn fetch_text(&self, url: &Url) -> Result<String, ScrapeError>;

    /// Fetch the body of `url` as raw bytes. Non-success statuses are errors.
    fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ScrapeError>;
}

/// Blocking HTTP client with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(HttpFetcher { client })
    }

    pub fn from_settings(settings: &ScrapeSettings) -> Result<Self> {
        Self::new(&settings.user_agent, settings.timeout())
    }

    fn get(&self, url: &Url) -> Result<reqwest::blocking::Response, ScrapeError> {
        trace!("GET {}", url);
        self.client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| fetch_error(url, err))
    }
}

impl Fetch for HttpFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String, ScrapeError> {
        self.get(url)?.text().map_err(|err| fetch_error(url, err))
    }

    fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ScrapeError> {
        self.get(url)?
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| fetch_error(url, err))
    }
}

fn fetch_error(url: &Url, err: reqwest::Error) -> ScrapeError {
    ScrapeError::Fetch {
        url: url.to_string(),
        source: Box::new(err),
    }
}
