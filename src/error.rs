//! Error taxonomy for the scraper.
//!
//! Only failures that end a crawl or an explicit call surface here. Malformed
//! per-article metadata is recovered inside the extractor and never reaches
//! this type, and running out of pages is normal termination.

use thiserror::Error;

/// Errors returned by the library.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport-level failure from the HTTP client.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The site answered with a non-success status code.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A URL could not be parsed or joined against the base URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A "see more" response did not contain a readable JSON envelope.
    #[error("malformed pagination envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// A prefetched inline payload was still not valid JSON after key repair.
    #[error("unparseable inline payload: {0}")]
    InlineJson(#[source] serde_json::Error),

    /// Count text contained no digits (or overflowed).
    #[error("no count in {0:?}")]
    InvalidCount(String),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
