//! Page and image retrieval.
//!
//! Two seams live here: [`PageFetcher`] retrieves the markup for the page being
//! harvested, [`ImageFetcher`] retrieves the raw bytes of one image. Both are
//! object-safe so the pipeline can hold whichever variant the run selected.
//!
//! Each call is a single attempt. Transient failures are reported to the
//! caller, never retried here.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use imgharvest_core::fetch::{HttpFetcher, PageFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
//! let html = fetcher.fetch_page("https://example.com/").await?;
//! println!("{} bytes of markup", html.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
#[cfg(feature = "render")]
mod render;

pub use client::HttpFetcher;
pub use error::{DownloadError, FetchError};
#[cfg(feature = "render")]
pub use render::{CapturingPageFetcher, RenderedPageFetcher};

use async_trait::async_trait;
use url::Url;

use crate::pipeline::ImageDimensions;

/// Raw bytes of one downloaded image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// URL the bytes were requested from.
    pub url: String,
    /// Response body, verbatim.
    pub bytes: Vec<u8>,
    /// `Content-Type` header value, if the server sent one.
    pub content_type: Option<String>,
    /// Extension the saved file must carry, replacing the one in the URL.
    pub forced_extension: Option<&'static str>,
    /// Size stated by the source itself. Takes precedence over the header probe.
    pub declared_dimensions: Option<ImageDimensions>,
}

/// Retrieves the markup of the page being harvested.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page at `url` and returns its markup.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on an unsupported scheme, timeout, connection
    /// failure, or non-success HTTP status.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Retrieves the bytes of a single image.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Downloads the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on an unsupported scheme, timeout, connection
    /// failure, or non-success HTTP status.
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, DownloadError>;
}

/// Why a URL was refused before any request was sent.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum UrlRejection {
    Invalid,
    Scheme(String),
}

/// Parses `url` and accepts only `http` and `https`.
pub(crate) fn parse_retrievable_url(url: &str) -> Result<Url, UrlRejection> {
    let parsed = Url::parse(url).map_err(|_| UrlRejection::Invalid)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UrlRejection::Scheme(other.to_string())),
    }
}
