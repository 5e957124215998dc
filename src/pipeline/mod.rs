//! Pipeline orchestrator: fetch the page, extract references, then download,
//! filter, and save each image in order.
//!
//! Only three conditions abort a run, all before the first image is touched:
//! the output directory cannot be prepared, the page cannot be fetched, or
//! the markup cannot be interpreted. Everything that goes wrong for a single
//! image is captured in its [`ImageOutcome`] and the loop moves on.

mod outcome;

pub use outcome::{ImageDimensions, ImageOutcome, OutcomeKind, RunResult};

use thiserror::Error;
use tracing::{Instrument, debug, info, info_span};

#[cfg(feature = "render")]
use crate::capture::{CaptureStore, CapturedExtractor, CapturedImageFetcher};
use crate::config::RunConfig;
use crate::extract::{ExtractError, HtmlExtractor, ReferenceExtractor};
use crate::fetch::{FetchError, HttpFetcher, ImageFetcher, PageFetcher};
use crate::filter::{self, FilterDecision};
use crate::storage::{self, DirectoryError};

/// Fatal conditions that end a run before any reference is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The output directory could not be created.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The page could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The page markup could not be interpreted.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Receives progress notifications while a run is in flight.
///
/// Callbacks happen in processing order, on the task driving the run.
pub trait RunObserver {
    /// Called once after extraction with the number of references found.
    fn on_references(&mut self, _total: usize) {}

    /// Called after each reference is processed. `index` is 1-based.
    fn on_outcome(&mut self, index: usize, total: usize, outcome: &ImageOutcome);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_outcome(&mut self, _index: usize, _total: usize, _outcome: &ImageOutcome) {}
}

/// The fetch/extract/download capability set a run is bound to.
pub struct Pipeline {
    page_fetcher: Box<dyn PageFetcher>,
    extractor: Box<dyn ReferenceExtractor>,
    image_fetcher: Box<dyn ImageFetcher>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Binds an explicit set of capabilities.
    #[must_use]
    pub fn new(
        page_fetcher: Box<dyn PageFetcher>,
        extractor: Box<dyn ReferenceExtractor>,
        image_fetcher: Box<dyn ImageFetcher>,
    ) -> Self {
        Self {
            page_fetcher,
            extractor,
            image_fetcher,
        }
    }

    /// Plain HTTP page fetch plus HTML extraction.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn http(config: &RunConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.timeout())?;
        Ok(Self::new(
            Box::new(fetcher.clone()),
            Box::new(HtmlExtractor::new()),
            Box::new(fetcher),
        ))
    }

    /// Selects the capability set from `config`: element capture, rendered
    /// page, or plain HTTP, in that order of precedence.
    ///
    /// Only element capture replaces the image download; the rendered page
    /// variant still downloads images over plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the HTTP client cannot be built, or if
    /// rendering was requested but support for it is not compiled in.
    pub fn for_config(config: &RunConfig) -> Result<Self, FetchError> {
        if config.capture() {
            Self::captured(config)
        } else if config.render() {
            Self::rendered(config)
        } else {
            Self::http(config)
        }
    }

    #[cfg(feature = "render")]
    fn rendered(config: &RunConfig) -> Result<Self, FetchError> {
        let images = HttpFetcher::new(config.timeout())?;
        Ok(Self::new(
            Box::new(crate::fetch::RenderedPageFetcher::new(config.render_timeout())),
            Box::new(HtmlExtractor::new()),
            Box::new(images),
        ))
    }

    #[cfg(feature = "render")]
    #[allow(clippy::unnecessary_wraps)]
    fn captured(config: &RunConfig) -> Result<Self, FetchError> {
        let store = CaptureStore::new();
        Ok(Self::new(
            Box::new(crate::fetch::CapturingPageFetcher::new(
                config.render_timeout(),
                store.clone(),
            )),
            Box::new(CapturedExtractor::new(store.clone())),
            Box::new(CapturedImageFetcher::new(store)),
        ))
    }

    #[cfg(not(feature = "render"))]
    fn rendered(config: &RunConfig) -> Result<Self, FetchError> {
        Err(render_unavailable(config))
    }

    #[cfg(not(feature = "render"))]
    fn captured(config: &RunConfig) -> Result<Self, FetchError> {
        Err(render_unavailable(config))
    }

    /// Runs the whole pipeline for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only for the fatal pre-loop conditions;
    /// per-image failures are reported inside the [`RunResult`].
    pub async fn run(
        &self,
        config: &RunConfig,
        observer: &mut dyn RunObserver,
    ) -> Result<RunResult, PipelineError> {
        storage::ensure_directory(config.output_dir()).await?;

        let markup = self.page_fetcher.fetch_page(config.url()).await?;
        let references = self.extractor.extract(&markup, config.url())?;
        let total = references.len();
        info!(total, url = %config.url(), "image references found");
        observer.on_references(total);

        let mut outcomes = Vec::with_capacity(total);
        for (position, reference) in references.iter().enumerate() {
            let index = position + 1;
            let outcome = self
                .process(reference, index, config)
                .instrument(info_span!("image", index, total, url = %reference))
                .await;
            observer.on_outcome(index, total, &outcome);
            outcomes.push(outcome);
        }

        Ok(RunResult::from_outcomes(outcomes))
    }

    async fn process(&self, url: &str, index: usize, config: &RunConfig) -> ImageOutcome {
        let image = match self.image_fetcher.fetch_image(url).await {
            Ok(image) => image,
            Err(e) => {
                debug!(error = %e, "download failed");
                return ImageOutcome::failed(url, e.to_string(), None);
            }
        };

        let dimensions = image
            .declared_dimensions
            .or_else(|| filter::image_dimensions(&image.bytes));
        let bounds = config.bounds();
        if bounds.is_active() {
            match filter::evaluate(dimensions, bounds) {
                FilterDecision::Admit(_) => {}
                FilterDecision::Reject(dimensions) => {
                    debug!(%dimensions, %bounds, "outside size bounds");
                    return ImageOutcome::filtered(url, Some(dimensions));
                }
                FilterDecision::Unreadable => {
                    debug!("dimensions unreadable while bounds are set");
                    return ImageOutcome::filtered(url, None);
                }
            }
        }

        let mut desired = storage::desired_filename(url, index, image.content_type.as_deref());
        if let Some(extension) = image.forced_extension {
            desired = storage::replace_extension(&desired, extension);
        }
        match storage::save(&image.bytes, config.output_dir(), &desired).await {
            Ok(path) => ImageOutcome::succeeded(url, path, dimensions),
            Err(e) => {
                debug!(error = %e, "write failed");
                ImageOutcome::failed(url, e.to_string(), dimensions)
            }
        }
    }
}

#[cfg(not(feature = "render"))]
fn render_unavailable(config: &RunConfig) -> FetchError {
    FetchError::render(
        config.url(),
        "page rendering is not available in this build (enable the `render` feature)",
    )
}
