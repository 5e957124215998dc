//! Error types for page and image fetches.
//!
//! Page failures ([`FetchError`]) abort the run; image failures
//! ([`DownloadError`]) are recorded against a single reference.

use thiserror::Error;

/// Errors raised while retrieving the page markup.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL uses a scheme other than `http` or `https`.
    #[error("unsupported URL scheme '{scheme}' for {url}")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
        /// Its scheme.
        scheme: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The headless browser failed to load or render the page.
    #[error("failed to render {url}: {message}")]
    Render {
        /// The page URL.
        url: String,
        /// Browser-side error detail.
        message: String,
    },
}

impl FetchError {
    /// Creates an unsupported-scheme error.
    pub fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a rendering error.
    pub fn render(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            url: url.into(),
            message: message.into(),
        }
    }

    /// HTTP status code, when the server answered with one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while retrieving one image.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL uses a scheme other than `http` or `https`.
    #[error("unsupported URL scheme '{scheme}' for {url}")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
        /// Its scheme.
        scheme: String,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error, including a body that stopped mid-transfer.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The rendered element could not be captured.
    #[error("failed to capture {url}: {message}")]
    Capture {
        /// The element's image URL.
        url: String,
        /// Browser-side error detail.
        message: String,
    },
}

impl DownloadError {
    /// Creates an unsupported-scheme error.
    pub fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an element capture error.
    pub fn capture(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capture {
            url: url.into(),
            message: message.into(),
        }
    }

    /// HTTP status code, when the server answered with one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` impls: every variant needs the URL, which the
// source error may not carry.
