//! Classification of failed requests.
//!
//! Every request that does not yield a 2xx response ends up as exactly one
//! [`TransportFailure`]. None of them stop a crawl: they are logged with the
//! URL and kind, and the remaining windows are still issued.

use std::error::Error as _;

use reqwest::header::HeaderMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus,
    NameResolution,
    Timeout,
    Unclassified,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpStatus => "http_status",
            Self::NameResolution => "name_resolution",
            Self::Timeout => "timeout",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TransportFailure {
    /// Non-2xx answer. Headers are kept so session cookies set on a rejection
    /// still reach the adapter.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        url: String,
        status: u16,
        headers: HeaderMap,
    },

    #[error("could not resolve host for {url}: {detail}")]
    NameResolution { url: String, detail: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {detail}")]
    Unclassified { url: String, detail: String },
}

impl TransportFailure {
    /// Maps a reqwest error raised while talking to `url`.
    #[must_use]
    pub fn classify(err: &reqwest::Error, url: &str) -> Self {
        let url = url.to_owned();
        if err.is_timeout() {
            return Self::Timeout { url };
        }
        let detail = error_chain(err);
        if is_name_resolution(&detail) {
            Self::NameResolution { url, detail }
        } else {
            Self::Unclassified { url, detail }
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::NameResolution { .. } => FailureKind::NameResolution,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Unclassified { .. } => FailureKind::Unclassified,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::HttpStatus { url, .. }
            | Self::NameResolution { url, .. }
            | Self::Timeout { url }
            | Self::Unclassified { url, .. } => url,
        }
    }

    /// Response headers, when the server answered at all.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::HttpStatus { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Whether the transport may try the same request again.
    ///
    /// - 429 and 5xx: the server may recover.
    /// - timeouts and unclassified connection errors: usually transient.
    /// - other 4xx and DNS failures: retrying returns the same answer.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } | Self::Unclassified { .. } => true,
            Self::NameResolution { .. } => false,
        }
    }

    /// Logs the failure with enough context to diagnose it.
    pub fn report(&self) {
        match self {
            Self::HttpStatus { url, status, .. } => {
                tracing::error!(kind = %self.kind(), url = %url, status, "request failed");
            }
            Self::NameResolution { url, detail } | Self::Unclassified { url, detail } => {
                tracing::error!(
                    kind = %self.kind(),
                    url = %url,
                    detail = %detail,
                    "request failed"
                );
            }
            Self::Timeout { url } => {
                tracing::error!(kind = %self.kind(), url = %url, "request failed");
            }
        }
    }
}

/// `err` and all its sources joined with `": "`; reqwest buries the resolver
/// message several levels down.
fn error_chain(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

fn is_name_resolution(detail: &str) -> bool {
    let lower = detail.to_ascii_lowercase();
    ["dns error", "failed to lookup address", "name or service not known", "no such host"]
        .iter()
        .any(|needle| lower.contains(needle))
}
