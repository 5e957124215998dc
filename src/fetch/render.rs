//! Headless-browser page fetchers for script-built pages.
//!
//! Both variants launch Chromium, navigate, and wait until the document is
//! complete and every image element has finished loading. Launch plus
//! navigation share one budget.
//!
//! [`RenderedPageFetcher`] returns the serialized DOM, which then goes through
//! the plain HTML extractor. [`CapturingPageFetcher`] also screenshots every
//! `<img>` element into a [`CaptureStore`]; each screenshot gets the full
//! budget again.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::{PageFetcher, UrlRejection, parse_retrievable_url};
use crate::capture::{CaptureStore, ElementCapture, declared_dimensions};
use crate::user_agent;

const SETTLE_POLL: Duration = Duration::from_millis(100);

const SETTLE_SCRIPT: &str = r"(() => ({
    ready: document.readyState === 'complete',
    images: Array.from(document.images).every((img) => img.complete),
}))()";

#[derive(Debug, Deserialize)]
struct SettleState {
    ready: bool,
    images: bool,
}

/// Renders pages in headless Chromium before extraction.
#[derive(Debug, Clone)]
pub struct RenderedPageFetcher {
    budget: Duration,
}

impl RenderedPageFetcher {
    /// Creates a fetcher that abandons a page when launch plus navigation
    /// exceed `budget`.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

#[async_trait]
impl PageFetcher for RenderedPageFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        check_url(url)?;
        let deadline = Instant::now() + self.budget;
        let session = Session::launch(url, self.budget, deadline).await?;

        let rendered = async {
            let page = session.open(url, deadline).await?;
            page.content()
                .await
                .map_err(|e| FetchError::render(url, e.to_string()))
        }
        .await;

        session.close().await;
        let html = rendered?;
        debug!(bytes = html.len(), "rendered page captured");
        Ok(html)
    }
}

/// Renders the page and screenshots each `<img>` element into a shared store.
///
/// Pair with [`CapturedExtractor`](crate::capture::CapturedExtractor) and
/// [`CapturedImageFetcher`](crate::capture::CapturedImageFetcher) over the
/// same [`CaptureStore`].
#[derive(Debug, Clone)]
pub struct CapturingPageFetcher {
    budget: Duration,
    store: CaptureStore,
}

impl CapturingPageFetcher {
    /// Creates a fetcher recording into `store`.
    #[must_use]
    pub fn new(budget: Duration, store: CaptureStore) -> Self {
        Self { budget, store }
    }

    async fn capture_page(
        &self,
        session: &Session,
        url: &str,
        deadline: Instant,
    ) -> Result<String, FetchError> {
        let page = session.open(url, deadline).await?;
        let base = document_base(&page, url).await?;

        let elements = page
            .find_elements("img")
            .await
            .map_err(|e| FetchError::render(url, e.to_string()))?;
        info!(count = elements.len(), "image elements found");

        let mut captures = Vec::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            let index = position + 1;
            let src = match element.attribute("src").await {
                Ok(Some(src)) if !src.trim().is_empty() => src,
                Ok(_) => {
                    debug!(index, "element has no src, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(index, error = %e, "failed to read element src, skipping");
                    continue;
                }
            };

            let screenshot =
                match timeout(self.budget, element.screenshot(CaptureScreenshotFormat::Png)).await
                {
                    Ok(Ok(png)) => Ok(png),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {}s", self.budget.as_secs())),
                };
            if let Err(message) = &screenshot {
                debug!(index, src = %src, error = %message, "element capture failed");
            }

            let width = element.attribute("width").await.ok().flatten();
            let height = element.attribute("height").await.ok().flatten();
            captures.push(ElementCapture {
                src,
                screenshot,
                declared: declared_dimensions(width.as_deref(), height.as_deref()),
            });
        }

        let kept = self.store.record(&base, captures);
        debug!(kept, "element captures recorded");
        page.content()
            .await
            .map_err(|e| FetchError::render(url, e.to_string()))
    }
}

#[async_trait]
impl PageFetcher for CapturingPageFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        check_url(url)?;
        let deadline = Instant::now() + self.budget;
        let session = Session::launch(url, self.budget, deadline).await?;
        let result = self.capture_page(&session, url, deadline).await;
        session.close().await;
        result
    }
}

fn check_url(url: &str) -> Result<(), FetchError> {
    parse_retrievable_url(url)
        .map(|_| ())
        .map_err(|rejection| match rejection {
            UrlRejection::Invalid => FetchError::invalid_url(url),
            UrlRejection::Scheme(scheme) => FetchError::unsupported_scheme(url, scheme),
        })
}

/// The document's effective base URL, honouring `<base href>`.
async fn document_base(page: &Page, url: &str) -> Result<Url, FetchError> {
    let base_uri = match page.evaluate("document.baseURI").await {
        Ok(result) => result.into_value::<String>().ok(),
        Err(e) => {
            debug!(error = %e, "document.baseURI unavailable, using page URL");
            None
        }
    };
    base_uri
        .and_then(|uri| Url::parse(&uri).ok())
        .or_else(|| Url::parse(url).ok())
        .ok_or_else(|| FetchError::invalid_url(url))
}

/// One headless Chromium process and the task driving its event stream.
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Session {
    async fn launch(url: &str, budget: Duration, deadline: Instant) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .request_timeout(budget)
            .arg(format!("--user-agent={}", user_agent::default_user_agent()))
            .build()
            .map_err(|message| FetchError::render(url, message))?;

        let (browser, mut handler) = timeout_at(deadline, Browser::launch(config))
            .await
            .map_err(|_| FetchError::timeout(url))?
            .map_err(|e| FetchError::render(url, e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });
        Ok(Self { browser, handler })
    }

    /// Opens `url` and waits until it has settled, all before `deadline`.
    async fn open(&self, url: &str, deadline: Instant) -> Result<Page, FetchError> {
        let navigation = async {
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| FetchError::render(url, e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::render(url, e.to_string()))?;
            wait_for_settled(&page).await;
            Ok::<_, FetchError>(page)
        };
        timeout_at(deadline, navigation)
            .await
            .map_err(|_| FetchError::timeout(url))?
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "failed to close headless browser");
        }
        self.handler.abort();
    }
}

/// Polls until the document is complete and every image element has loaded
/// or failed. The caller bounds the wait.
async fn wait_for_settled(page: &Page) {
    loop {
        match page.evaluate(SETTLE_SCRIPT).await {
            Ok(result) => match result.into_value::<SettleState>() {
                Ok(state) if state.ready && state.images => return,
                Ok(_) => {}
                Err(e) => debug!(error = %e, "unexpected settle state"),
            },
            Err(e) => debug!(error = %e, "settle check failed, retrying"),
        }
        tokio::time::sleep(SETTLE_POLL).await;
    }
}
