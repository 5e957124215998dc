//! Per-reference outcomes and the aggregated run result.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Pixel dimensions read from an image header. Both values are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Final disposition of one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Downloaded, admitted, and written to disk.
    Succeeded,
    /// Download or write failed.
    Failed,
    /// Rejected by the size bounds, or unreadable while bounds were set.
    Filtered,
}

/// What happened to one reference. Created once and never revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageOutcome {
    url: String,
    kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<ImageDimensions>,
}

impl ImageOutcome {
    /// The image was saved to `saved_path`.
    #[must_use]
    pub fn succeeded(
        url: impl Into<String>,
        saved_path: PathBuf,
        dimensions: Option<ImageDimensions>,
    ) -> Self {
        Self {
            url: url.into(),
            kind: OutcomeKind::Succeeded,
            saved_path: Some(saved_path),
            error: None,
            dimensions,
        }
    }

    /// The image could not be downloaded or written.
    #[must_use]
    pub fn failed(
        url: impl Into<String>,
        error: impl Into<String>,
        dimensions: Option<ImageDimensions>,
    ) -> Self {
        Self {
            url: url.into(),
            kind: OutcomeKind::Failed,
            saved_path: None,
            error: Some(error.into()),
            dimensions,
        }
    }

    /// The image did not meet the size bounds.
    #[must_use]
    pub fn filtered(url: impl Into<String>, dimensions: Option<ImageDimensions>) -> Self {
        Self {
            url: url.into(),
            kind: OutcomeKind::Filtered,
            saved_path: None,
            error: None,
            dimensions,
        }
    }

    /// Source URL of the image.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Disposition.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Where the image was written; only set for [`OutcomeKind::Succeeded`].
    #[must_use]
    pub fn saved_path(&self) -> Option<&Path> {
        self.saved_path.as_deref()
    }

    /// Error detail; only set for [`OutcomeKind::Failed`].
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Dimensions, whenever they were determined.
    #[must_use]
    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.dimensions
    }
}

/// Summary of a completed run.
///
/// `total == succeeded + failed + filtered == outcomes().len()` always holds,
/// and outcomes are in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    succeeded: usize,
    failed: usize,
    filtered: usize,
    total: usize,
    outcomes: Vec<ImageOutcome>,
}

impl RunResult {
    /// Builds the summary by counting `outcomes`.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<ImageOutcome>) -> Self {
        let count = |kind| outcomes.iter().filter(|o| o.kind == kind).count();
        Self {
            succeeded: count(OutcomeKind::Succeeded),
            failed: count(OutcomeKind::Failed),
            filtered: count(OutcomeKind::Filtered),
            total: outcomes.len(),
            outcomes,
        }
    }

    /// Number of images saved.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of images that failed to download or save.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of images rejected by the size bounds.
    #[must_use]
    pub fn filtered(&self) -> usize {
        self.filtered
    }

    /// Number of references processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Per-reference outcomes in processing order.
    #[must_use]
    pub fn outcomes(&self) -> &[ImageOutcome] {
        &self.outcomes
    }
}
