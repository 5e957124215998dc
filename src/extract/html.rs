//! `<img>` reference extraction backed by `scraper`.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::{ExtractError, ReferenceExtractor};

// Hardcoded selectors; a parse failure here is a programming error.
#[allow(clippy::expect_used)]
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("hardcoded selector `img[src]`"));

#[allow(clippy::expect_used)]
static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("hardcoded selector `base[href]`"));

/// Extracts `src` references of every `<img>` element.
///
/// Parsing is lenient: malformed markup yields whatever image elements the
/// HTML5 tree builder recovers. File extensions are not inspected; anything
/// with a retrievable scheme is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Creates a new extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceExtractor for HtmlExtractor {
    #[instrument(skip(self, markup), fields(base_url = %base_url, markup_len = markup.len()))]
    fn extract(&self, markup: &str, base_url: &str) -> Result<Vec<String>, ExtractError> {
        let page_url = Url::parse(base_url).map_err(|_| ExtractError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;

        if markup.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document = Html::parse_document(markup);
        let base = document_base(&document, &page_url);

        let mut seen = HashSet::new();
        let mut references = Vec::new();
        for element in document.select(&IMG_SELECTOR) {
            let Some(raw) = element.value().attr("src") else {
                continue;
            };
            let Some(resolved) = resolve_reference(&base, raw) else {
                continue;
            };
            if seen.insert(resolved.clone()) {
                references.push(resolved);
            }
        }

        debug!(count = references.len(), "extracted image references");
        Ok(references)
    }
}

/// Effective base URL: the first `<base href>` resolved against the page URL,
/// else the page URL itself.
fn document_base(document: &Html, page_url: &Url) -> Url {
    document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(trim_url_whitespace(href)).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves one `src` value, or `None` when it is empty, embedded data, or
/// not retrievable over HTTP(S).
pub(crate) fn resolve_reference(base: &Url, raw: &str) -> Option<String> {
    let src = trim_url_whitespace(raw);
    if src.is_empty() {
        return None;
    }
    if src
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
    {
        return None;
    }

    let mut resolved = match base.join(src) {
        Ok(url) => url,
        Err(e) => {
            debug!(src = %src, error = %e, "skipping unresolvable reference");
            return None;
        }
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        debug!(src = %src, scheme = resolved.scheme(), "skipping non-retrievable reference");
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.into())
}

fn trim_url_whitespace(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_ascii_whitespace())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/gallery/index.html";

    fn extract(markup: &str) -> Vec<String> {
        HtmlExtractor::new().extract(markup, BASE).unwrap()
    }

    #[test]
    fn test_extract_absolute_and_relative_references() {
        let refs = extract(
            r#"<html><body>
                <img src="https://cdn.example.com/a.jpg">
                <img src="/images/b.png">
                <img src="c.gif">
                <img src="../d.webp">
                <img src="//static.example.org/e.svg">
            </body></html>"#,
        );
        assert_eq!(
            refs,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://example.com/images/b.png",
                "https://example.com/gallery/c.gif",
                "https://example.com/d.webp",
                "https://static.example.org/e.svg",
            ]
        );
    }

    #[test]
    fn test_extract_skips_empty_missing_and_data_references() {
        let refs = extract(
            r#"<img><img src=""><img src="   "><img src="data:image/png;base64,AAAA">
               <img src="DATA:image/gif;base64,R0lG"><img src="ok.png">"#,
        );
        assert_eq!(refs, vec!["https://example.com/gallery/ok.png"]);
    }

    #[test]
    fn test_extract_skips_non_retrievable_schemes() {
        let refs = extract(
            r#"<img src="javascript:alert(1)"><img src="mailto:a@b.c">
               <img src="ftp://example.com/x.png"><img src="about:blank"><img src="y.png">"#,
        );
        assert_eq!(refs, vec!["https://example.com/gallery/y.png"]);
    }

    #[test]
    fn test_extract_deduplicates_preserving_first_occurrence_order() {
        let refs = extract(
            r#"<img src="b.png"><img src="a.png"><img src="b.png">
               <img src="https://example.com/gallery/a.png"><img src="c.png">"#,
        );
        assert_eq!(
            refs,
            vec![
                "https://example.com/gallery/b.png",
                "https://example.com/gallery/a.png",
                "https://example.com/gallery/c.png",
            ]
        );
    }

    #[test]
    fn test_extract_does_not_filter_by_extension() {
        let refs = extract(r#"<img src="photo.tiff"><img src="/render?id=7"><img src="blob">"#);
        assert_eq!(refs.len(), 3);
        assert!(refs.contains(&"https://example.com/render?id=7".to_string()));
    }

    #[test]
    fn test_extract_keeps_query_and_drops_fragment() {
        let refs = extract(r#"<img src="pic.jpg?w=200#top"><img src="pic.jpg?w=200#bottom">"#);
        assert_eq!(refs, vec!["https://example.com/gallery/pic.jpg?w=200"]);
    }

    #[test]
    fn test_extract_honours_base_href() {
        let refs = extract(
            r#"<html><head><base href="https://assets.example.net/v2/"></head>
               <body><img src="logo.png"></body></html>"#,
        );
        assert_eq!(refs, vec!["https://assets.example.net/v2/logo.png"]);
    }

    #[test]
    fn test_extract_relative_base_href_resolves_against_page() {
        let refs = extract(r#"<base href="/static/"><img src="x.png">"#);
        assert_eq!(refs, vec!["https://example.com/static/x.png"]);
    }

    #[test]
    fn test_extract_base_without_href_is_skipped() {
        let refs = extract(r#"<base target="_blank"><base href="/cdn/"><img src="x.png">"#);
        assert_eq!(refs, vec!["https://example.com/cdn/x.png"]);
    }

    #[test]
    fn test_extract_ignores_elements_merely_named_like_img() {
        let refs = extract(r#"<picture><source src="s.png"><img src="i.png"></picture><imgx src="n.png">"#);
        assert_eq!(refs, vec!["https://example.com/gallery/i.png"]);
    }

    #[test]
    fn test_extract_empty_markup_returns_empty() {
        assert!(extract("").is_empty());
        assert!(extract("<html><body><p>no images</p></body></html>").is_empty());
    }

    #[test]
    fn test_extract_malformed_markup_is_lenient() {
        let refs = extract(r#"<div><img src="a.png"<p><img src='b.png'></div></span>"#);
        assert!(refs.contains(&"https://example.com/gallery/b.png".to_string()));
    }

    #[test]
    fn test_extract_trims_whitespace_in_src() {
        let refs = extract("<img src=\"\n  spaced.png \t\">");
        assert_eq!(refs, vec!["https://example.com/gallery/spaced.png"]);
    }

    #[test]
    fn test_extract_invalid_base_url_is_error() {
        let err = HtmlExtractor::new()
            .extract("<img src=\"a.png\">", "not a url")
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidBaseUrl { .. }));
    }
}
