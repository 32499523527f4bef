//! [`SourceFetcher`] implementation on top of reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::model::{FetchOutcome, GeoFeature};
use crate::ports::{FetchError, SourceFetcher};

/// Top-level shape every boundary document must have.
#[derive(Debug, Deserialize)]
struct BoundaryDocument {
    features: Vec<GeoFeature>,
    // "type" and any extra metadata are ignored
}

/// Fetches boundary documents over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Wrap an existing client; `timeout` is only used to label timeout errors.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Build a client carrying the configured user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialised.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self::new(client, config.fetch_timeout))
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<GeoFeature>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.classify(&err))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "boundary response");
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|err| self.classify(&err))?;
        parse_features(&body)
    }

    fn classify(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            FetchError::MalformedPayload(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        match self.try_fetch(url).await {
            Ok(features) => {
                debug!(url, features = features.len(), "boundary document parsed");
                FetchOutcome::Success(features)
            }
            Err(err) => {
                debug!(url, error = %err, "boundary fetch failed");
                FetchOutcome::Failure(err)
            }
        }
    }
}

/// Extract the `features` array of a boundary document.
///
/// # Errors
///
/// Returns [`FetchError::MalformedPayload`] when the body is not JSON or
/// `features` is missing or not an array.
pub fn parse_features(body: &[u8]) -> Result<Vec<GeoFeature>, FetchError> {
    serde_json::from_slice::<BoundaryDocument>(body)
        .map(|document| document.features)
        .map_err(|err| FetchError::MalformedPayload(err.to_string()))
}
