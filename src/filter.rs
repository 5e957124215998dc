//! Size filter: header-only dimension probing.
//!
//! Only the image header is decoded, never the pixel data. Anything that
//! cannot be identified (corrupt, truncated, unsupported format such as SVG)
//! reports no dimensions instead of an error.

use tracing::debug;

use crate::config::SizeBounds;
use crate::pipeline::ImageDimensions;

/// Reads width and height from the image header in `bytes`.
///
/// Returns `None` for unrecognised or truncated data and for zero-sized images.
#[must_use]
pub fn image_dimensions(bytes: &[u8]) -> Option<ImageDimensions> {
    let size = match imagesize::blob_size(bytes) {
        Ok(size) => size,
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "image header not readable");
            return None;
        }
    };
    let width = u32::try_from(size.width).ok()?;
    let height = u32::try_from(size.height).ok()?;
    (width > 0 && height > 0).then_some(ImageDimensions { width, height })
}

/// Result of evaluating an image against configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Dimensions satisfy every bound.
    Admit(ImageDimensions),
    /// Dimensions were read but violate at least one bound.
    Reject(ImageDimensions),
    /// Dimensions could not be read.
    Unreadable,
}

/// Checks known `dimensions` against `bounds`.
///
/// `None` means the size could not be determined.
#[must_use]
pub fn evaluate(dimensions: Option<ImageDimensions>, bounds: &SizeBounds) -> FilterDecision {
    match dimensions {
        Some(dimensions) if bounds.admits(dimensions) => FilterDecision::Admit(dimensions),
        Some(dimensions) => FilterDecision::Reject(dimensions),
        None => FilterDecision::Unreadable,
    }
}
