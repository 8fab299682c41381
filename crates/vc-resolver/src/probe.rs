//! Header-only content-type probing.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use vc_core::config::{ApiConfig, ProbeConfig};
use vc_core::{Error, Result};

use crate::classifier::{ContentTypeHint, MediaLocator};

/// Source of server-reported content types for media locators.
#[async_trait::async_trait]
pub trait ContentTypeProber: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the content type of `locator`, `None` when the server sent none.
    async fn probe(&self, locator: &MediaLocator) -> Result<Option<ContentTypeHint>>;
}

/// Issues `HEAD` requests; relative locators resolve against the backend.
#[derive(Debug, Clone)]
pub struct HeadProber {
    client: Client,
    base_url: Url,
}

impl HeadProber {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base url '{base_url}': {e}")))?;

        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build probe client with timeout: {}", e);
            Client::new()
        });

        Ok(Self { client, base_url })
    }

    pub fn from_config(api: &ApiConfig, probe: &ProbeConfig) -> Result<Self> {
        Self::new(&api.base_url, probe.timeout())
    }

    /// Absolute URL for a locator.
    pub fn resolve(&self, locator: &MediaLocator) -> Result<Url> {
        let resolved = if locator.is_absolute() {
            Url::parse(locator.as_str())
        } else {
            self.base_url.join(locator.as_str())
        };
        resolved.map_err(|e| Error::Validation(format!("cannot resolve '{locator}': {e}")))
    }
}

#[async_trait::async_trait]
impl ContentTypeProber for HeadProber {
    fn name(&self) -> &'static str {
        "head"
    }

    async fn probe(&self, locator: &MediaLocator) -> Result<Option<ContentTypeHint>> {
        let url = self.resolve(locator)?;
        tracing::debug!(url = %url, "probing content type");

        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| Error::Probe(format!("HEAD {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Probe(format!(
                "HEAD {url} returned {}",
                response.status()
            )));
        }

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentTypeHint::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_core::ContainerKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loc(raw: &str) -> MediaLocator {
        MediaLocator::parse(raw).unwrap()
    }

    #[test]
    fn resolves_relative_against_base() {
        let prober = HeadProber::new("http://cache.lan:5000", Duration::from_secs(1)).unwrap();
        let url = prober.resolve(&loc("cache/3/ep1.mp4")).unwrap();
        assert_eq!(url.as_str(), "http://cache.lan:5000/cache/3/ep1.mp4");

        let url = prober
            .resolve(&loc("https://cdn.example/v.mp4?sig=1"))
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/v.mp4?sig=1");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = HeadProber::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn head_reports_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/cache/ep1.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "video/MP2T"))
            .mount(&server)
            .await;

        let prober = HeadProber::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let hint = prober.probe(&loc("/cache/ep1.mp4")).await.unwrap().unwrap();
        assert_eq!(hint.as_str(), "video/mp2t");
        assert_eq!(hint.container(), Some(ContainerKind::MpegTs));
    }

    #[tokio::test]
    async fn missing_content_type_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober = HeadProber::new(&server.uri(), Duration::from_secs(2)).unwrap();
        assert!(prober.probe(&loc("/a.mp4")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn error_status_is_probe_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let prober = HeadProber::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = prober.probe(&loc("/gone.mp4")).await.unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }
}
