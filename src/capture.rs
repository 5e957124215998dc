//! Element capture: every rendered `<img>` element saved as a PNG screenshot.
//!
//! The browser side (`render` feature) screenshots each element while the page
//! is fetched and records the results in a shared [`CaptureStore`]. The
//! [`CapturedExtractor`] and [`CapturedImageFetcher`] then hand those captures
//! to the pipeline as ordinary references and images, so the orchestrator
//! loop, size filter, and file writer run unchanged.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::extract::{ExtractError, ReferenceExtractor, resolve_reference};
use crate::fetch::{DownloadError, FetchedImage, ImageFetcher};
use crate::pipeline::ImageDimensions;

/// Result of screenshotting one `<img>` element.
#[derive(Debug, Clone)]
pub struct ElementCapture {
    /// Raw `src` attribute of the element.
    pub src: String,
    /// PNG screenshot, or why it could not be taken.
    pub screenshot: Result<Vec<u8>, String>,
    /// Size from the element's `width`/`height` attributes.
    pub declared: Option<ImageDimensions>,
}

#[derive(Debug, Clone)]
struct StoredCapture {
    url: String,
    screenshot: Result<Vec<u8>, String>,
    declared: Option<ImageDimensions>,
}

/// Captures of the most recently rendered page, keyed by resolved image URL.
///
/// Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct CaptureStore {
    entries: Arc<Mutex<Vec<StoredCapture>>>,
}

impl CaptureStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the store contents with the captures of one page.
    ///
    /// Each `src` is resolved against `base` with the same rules as plain
    /// extraction. Embedded, non-retrievable, and repeated references are
    /// dropped; the first element wins. Returns the number of captures kept.
    pub fn record(&self, base: &Url, captures: Vec<ElementCapture>) -> usize {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(captures.len());
        for capture in captures {
            let Some(url) = resolve_reference(base, &capture.src) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                debug!(url = %url, "duplicate element capture dropped");
                continue;
            }
            kept.push(StoredCapture {
                url,
                screenshot: capture.screenshot,
                declared: capture.declared,
            });
        }
        let count = kept.len();
        *self.lock() = kept;
        count
    }

    /// Resolved image URLs in document order.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        self.lock().iter().map(|entry| entry.url.clone()).collect()
    }

    fn find(&self, url: &str) -> Option<StoredCapture> {
        self.lock().iter().find(|entry| entry.url == url).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredCapture>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads element dimensions from `width`/`height` attribute values.
///
/// Both must be positive integers (`"120"`, not `"120px"` or `"50%"`);
/// otherwise the screenshot header decides.
#[must_use]
pub fn declared_dimensions(width: Option<&str>, height: Option<&str>) -> Option<ImageDimensions> {
    let parse = |value: Option<&str>| value?.trim().parse::<u32>().ok().filter(|v| *v > 0);
    Some(ImageDimensions {
        width: parse(width)?,
        height: parse(height)?,
    })
}

/// Lists the captured elements as the page's references. The markup is ignored.
#[derive(Debug, Clone)]
pub struct CapturedExtractor {
    store: CaptureStore,
}

impl CapturedExtractor {
    /// Creates an extractor reading from `store`.
    #[must_use]
    pub fn new(store: CaptureStore) -> Self {
        Self { store }
    }
}

impl ReferenceExtractor for CapturedExtractor {
    fn extract(&self, _markup: &str, base_url: &str) -> Result<Vec<String>, ExtractError> {
        Url::parse(base_url).map_err(|_| ExtractError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;
        let references = self.store.references();
        debug!(count = references.len(), "captured element references");
        Ok(references)
    }
}

/// Serves each captured screenshot as the image for its reference.
#[derive(Debug, Clone)]
pub struct CapturedImageFetcher {
    store: CaptureStore,
}

impl CapturedImageFetcher {
    /// Creates a fetcher reading from `store`.
    #[must_use]
    pub fn new(store: CaptureStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ImageFetcher for CapturedImageFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, DownloadError> {
        let entry = self
            .store
            .find(url)
            .ok_or_else(|| DownloadError::capture(url, "no capture recorded for this element"))?;
        let png = entry
            .screenshot
            .map_err(|message| DownloadError::capture(url, message))?;
        Ok(FetchedImage {
            url: entry.url,
            bytes: png,
            content_type: Some("image/png".to_string()),
            forced_extension: Some(".png"),
            declared_dimensions: entry.declared,
        })
    }
}
