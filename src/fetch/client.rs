//! reqwest-backed fetcher for pages and images.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};

use super::error::{DownloadError, FetchError};
use super::{FetchedImage, ImageFetcher, PageFetcher, UrlRejection, parse_retrievable_url};
use crate::user_agent;

/// HTTP client serving both the page fetch and every image download.
///
/// Created once per run and shared, so connections to the same origin are
/// pooled across images.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests (connect plus body) give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying client cannot be built
    /// (for example, when the TLS backend fails to initialise).
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let parsed = parse_retrievable_url(url).map_err(|rejection| match rejection {
            UrlRejection::Invalid => FetchError::invalid_url(url),
            UrlRejection::Scheme(scheme) => FetchError::unsupported_scheme(url, scheme),
        })?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, DownloadError> {
        let parsed = parse_retrievable_url(url).map_err(|rejection| match rejection {
            UrlRejection::Invalid => DownloadError::invalid_url(url),
            UrlRejection::Scheme(scheme) => DownloadError::unsupported_scheme(url, scheme),
        })?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        match content_type.as_deref() {
            None => warn!(url = %url, "no Content-Type header on image response"),
            Some(ct) if !is_image_content_type(ct) => {
                warn!(url = %url, content_type = %ct, "unexpected Content-Type for image");
            }
            Some(_) => {}
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;
        debug!(bytes = bytes.len(), "image fetched");

        Ok(FetchedImage {
            url: url.to_string(),
            bytes: bytes.to_vec(),
            content_type,
            forced_extension: None,
            declared_dimensions: None,
        })
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
