//! The contract every airline backend implements.
//!
//! An adapter knows how to phrase a [`ScrapeWindow`] as one or more HTTP
//! requests, and how to turn the raw answer back into candidate offers.
//! Everything backend-agnostic (deduplication, station filtering, delivery)
//! happens downstream in the crawl pipeline.

use chrono::NaiveDate;
use fares_core::{CanonicalOffer, Company};
use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::request::{OutboundRequest, RawResponse};
use crate::schedule::ScrapeWindow;

/// Per-response identity of an offer, used only to drop repeats within one
/// parse pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfferKey(String);

impl OfferKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OfferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A response that could not be fully understood.
///
/// Response-scoped errors discard the whole payload; candidate-scoped errors
/// discard a single offer and leave its siblings intact. Neither stops the
/// crawl.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response from {url} is not valid JSON: {source}")]
    Body {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} is missing expected structure: {reason}")]
    Response { url: String, reason: String },

    #[error("skipping {candidate} from {url}: {reason}")]
    Candidate {
        url: String,
        candidate: String,
        reason: String,
    },
}

impl ParseError {
    #[must_use]
    pub fn is_candidate_scoped(&self) -> bool {
        matches!(self, ParseError::Candidate { .. })
    }
}

/// What one response yielded: candidate offers plus the candidate-scoped
/// errors hit along the way.
#[derive(Debug, Default)]
pub struct ParsedResponse {
    pub offers: Vec<(OfferKey, CanonicalOffer)>,
    pub errors: Vec<ParseError>,
}

impl ParsedResponse {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn push_offer(&mut self, key: OfferKey, offer: CanonicalOffer) {
        self.offers.push((key, offer));
    }

    pub(crate) fn push_error(
        &mut self,
        url: &str,
        candidate: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.errors.push(ParseError::Candidate {
            url: url.to_string(),
            candidate: candidate.into(),
            reason: reason.into(),
        });
    }
}

/// One airline backend.
///
/// `build_requests` only ever reads adapter state; `observe_headers` is the
/// single place a stateful adapter may update it. Implementations must be
/// safe to call concurrently from several in-flight requests.
pub trait BackendAdapter: Send + Sync {
    fn company(&self) -> Company;

    /// Longest window, in days, a single scheduled tuple may span.
    fn max_window_days(&self) -> u32;

    /// Upper bound on concurrent requests this backend tolerates, if lower
    /// than the crawl-wide limit.
    fn max_in_flight_hint(&self) -> Option<usize> {
        None
    }

    /// Requests covering `window`, in issue order.
    fn build_requests(&self, window: &ScrapeWindow) -> Vec<OutboundRequest>;

    /// Called with the headers of every HTTP response, successful or not and
    /// retried attempts included, before any parsing.
    fn observe_headers(&self, _headers: &HeaderMap) {}

    /// Extracts candidate offers from a successful response.
    ///
    /// # Errors
    ///
    /// Returns a response-scoped [`ParseError`] when the payload lacks its
    /// top-level structure. Candidate-level problems are reported in
    /// [`ParsedResponse::errors`] instead.
    fn parse_response(
        &self,
        response: &RawResponse,
        scrape_date: NaiveDate,
    ) -> Result<ParsedResponse, ParseError>;
}
