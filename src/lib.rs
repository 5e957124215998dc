//! imgharvest core library
//!
//! Downloads every image referenced by a web page into a directory, with
//! optional size filtering and collision-free filenames.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Immutable run configuration and size bounds
//! - [`fetch`] - Page and image retrieval over HTTP (or a headless browser)
//! - [`extract`] - `<img>` reference extraction from page markup
//! - [`filter`] - Header-only dimension probing
//! - [`storage`] - Output directory setup and deduplicated saves
//! - [`capture`] - Rendered `<img>` elements served as PNG screenshots
//! - [`pipeline`] - The orchestrator tying the stages together
//!
//! # Example
//!
//! ```no_run
//! use imgharvest_core::{NoopObserver, Pipeline, RunConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new("https://example.com/", "images");
//! let pipeline = Pipeline::for_config(&config)?;
//! let result = pipeline.run(&config, &mut NoopObserver).await?;
//! println!("{} of {} saved", result.succeeded(), result.total());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod storage;
mod user_agent;

// Re-export commonly used types
pub use capture::{CaptureStore, CapturedExtractor, CapturedImageFetcher, ElementCapture};
pub use config::{
    BoundsError, DEFAULT_RENDER_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, RunConfig, SizeBounds,
};
pub use extract::{ExtractError, HtmlExtractor, ReferenceExtractor};
pub use fetch::{DownloadError, FetchError, FetchedImage, HttpFetcher, ImageFetcher, PageFetcher};
pub use pipeline::{
    ImageDimensions, ImageOutcome, NoopObserver, OutcomeKind, Pipeline, PipelineError,
    RunObserver, RunResult,
};
pub use storage::{DirectoryError, FileWriteError};
