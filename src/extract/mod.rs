//! Image reference extraction from page markup.
//!
//! [`ReferenceExtractor`] is the seam; [`HtmlExtractor`] is the plain-HTML
//! implementation used for both the HTTP and the rendered page variants.

mod html;

pub use html::HtmlExtractor;
pub(crate) use html::resolve_reference;

use thiserror::Error;

/// Errors raised while turning markup into references.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page URL cannot serve as a base for relative references.
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The unparsable base URL.
        url: String,
    },
}

/// Produces the ordered, de-duplicated list of absolute image URLs on a page.
pub trait ReferenceExtractor: Send + Sync {
    /// Extracts image references from `markup`, resolving relative ones against `base_url`.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the markup cannot be interpreted at all.
    fn extract(&self, markup: &str, base_url: &str) -> Result<Vec<String>, ExtractError>;
}
