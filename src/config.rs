//! Run configuration shared by every pipeline stage.
//!
//! A [`RunConfig`] is built once by the caller before the pipeline starts and
//! is only ever borrowed afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::ImageDimensions;

/// Default per-request timeout for page and image fetches (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default budget for headless-browser work (30 seconds): launch plus
/// navigation, and separately each element capture.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

/// Optional minimum/maximum width and height constraints.
///
/// Each bound is independent; an unset bound never rejects an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeBounds {
    /// Smallest acceptable width in pixels.
    pub min_width: Option<u32>,
    /// Smallest acceptable height in pixels.
    pub min_height: Option<u32>,
    /// Largest acceptable width in pixels.
    pub max_width: Option<u32>,
    /// Largest acceptable height in pixels.
    pub max_height: Option<u32>,
}

/// A minimum bound is larger than the maximum bound on the same axis.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("--min-{axis} {min} is greater than --max-{axis} {max}")]
pub struct BoundsError {
    /// `width` or `height`.
    pub axis: &'static str,
    /// Configured minimum.
    pub min: u32,
    /// Configured maximum.
    pub max: u32,
}

impl SizeBounds {
    /// Returns `true` when at least one bound is configured.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.min_width.is_some()
            || self.min_height.is_some()
            || self.max_width.is_some()
            || self.max_height.is_some()
    }

    /// Returns `true` when `dimensions` satisfy every configured bound.
    #[must_use]
    pub fn admits(&self, dimensions: ImageDimensions) -> bool {
        within(dimensions.width, self.min_width, self.max_width)
            && within(dimensions.height, self.min_height, self.max_height)
    }

    /// Rejects bounds that can never admit an image.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] when a minimum exceeds the maximum on the same axis.
    pub fn validate(&self) -> Result<(), BoundsError> {
        if let (Some(min), Some(max)) = (self.min_width, self.max_width)
            && min > max
        {
            return Err(BoundsError {
                axis: "width",
                min,
                max,
            });
        }
        if let (Some(min), Some(max)) = (self.min_height, self.max_height)
            && min > max
        {
            return Err(BoundsError {
                axis: "height",
                min,
                max,
            });
        }
        Ok(())
    }
}

fn within(value: u32, min: Option<u32>, max: Option<u32>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

impl fmt::Display for SizeBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: Option<u32>) -> String {
            value.map_or_else(|| "any".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "width {}..{}, height {}..{}",
            show(self.min_width),
            show(self.max_width),
            show(self.min_height),
            show(self.max_height)
        )
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    url: String,
    output_dir: PathBuf,
    bounds: SizeBounds,
    verbose: bool,
    render: bool,
    capture: bool,
    timeout: Duration,
    render_timeout: Duration,
}

impl RunConfig {
    /// Creates a configuration with no size bounds and the default timeouts.
    #[must_use]
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            bounds: SizeBounds::default(),
            verbose: false,
            render: false,
            capture: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }

    /// Sets the size bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: SizeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Enables per-item detail reporting.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Selects the rendered-page fetch/extract pair instead of plain HTTP.
    #[must_use]
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Selects element capture: the page is rendered and each `<img>` element
    /// is saved as a PNG screenshot instead of being downloaded.
    #[must_use]
    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the headless-browser budget.
    #[must_use]
    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }

    /// Page URL to harvest.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Directory images are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Configured size bounds.
    #[must_use]
    pub fn bounds(&self) -> &SizeBounds {
        &self.bounds
    }

    /// Whether per-item detail was requested.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether the rendered-page variant was requested.
    #[must_use]
    pub fn render(&self) -> bool {
        self.render
    }

    /// Whether element capture was requested.
    #[must_use]
    pub fn capture(&self) -> bool {
        self.capture
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headless-browser budget.
    #[must_use]
    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }
}
