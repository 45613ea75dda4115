use thiserror::Error;

/// Construction-time errors for scraper components.
///
/// Per-request failures are not here: see [`crate::failure::TransportFailure`]
/// and [`crate::adapter::ParseError`], both of which are recovered locally.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("window size must be at least one day")]
    InvalidWindow,

    #[error("invalid endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },
}
