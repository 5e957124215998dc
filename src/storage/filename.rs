//! Filename derivation and sanitization for saved images.

use std::path::{Component, Path};

use url::Url;

/// Extension used when neither the URL nor the response says what the image is.
const FALLBACK_EXTENSION: &str = ".jpg";

/// Derives the filename an image should be saved under.
///
/// Uses the last URL path segment (percent-decoded and sanitized). When the
/// URL has no usable segment, falls back to `image_<index><ext>` with the
/// extension guessed from `content_type`.
#[must_use]
pub fn desired_filename(url: &str, index: usize, content_type: Option<&str>) -> String {
    if let Some(name) = Url::parse(url).ok().as_ref().and_then(last_segment_name) {
        return name;
    }
    let extension = content_type.map_or(FALLBACK_EXTENSION, extension_from_content_type);
    format!("image_{index}{extension}")
}

fn last_segment_name(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    let sanitized = cap_length(&sanitize_filename(&decoded));
    (!sanitized.trim_matches('_').is_empty()).then_some(sanitized)
}

/// Longest stem kept from a URL segment, in bytes. Leaves room for the
/// extension and a `_N` collision suffix under the usual 255-byte name limit.
const MAX_STEM_BYTES: usize = 120;

/// Anything longer after the last dot is treated as part of the stem.
const MAX_EXTENSION_BYTES: usize = 16;

/// Truncates the stem of `name` to [`MAX_STEM_BYTES`], keeping the extension.
fn cap_length(name: &str) -> String {
    let (stem, extension) = match split_stem_extension(name) {
        (_, extension) if extension.len() > MAX_EXTENSION_BYTES => (name, ""),
        parts => parts,
    };
    if stem.len() <= MAX_STEM_BYTES {
        return name.to_string();
    }
    let mut end = MAX_STEM_BYTES;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{extension}", &stem[..end])
}

/// Guesses a file extension from a `Content-Type` header.
pub(crate) fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/bmp" | "image/x-ms-bmp" => ".bmp",
        "image/avif" => ".avif",
        "image/tiff" => ".tiff",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        _ => FALLBACK_EXTENSION,
    }
}

/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |` and control characters) with `_`.
///
/// Names that would resolve to `.` or `..` have their dots rewritten too.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Splits `name` at its last dot into stem and extension (dot included).
///
/// A leading dot belongs to the stem, so `.hidden` has no extension.
#[must_use]
pub fn split_stem_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// Swaps the extension of `name` for `extension` (dot included).
#[must_use]
pub fn replace_extension(name: &str, extension: &str) -> String {
    let (stem, _) = split_stem_extension(name);
    format!("{stem}{extension}")
}
