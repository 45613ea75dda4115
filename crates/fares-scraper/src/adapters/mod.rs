//! Backend adapters, one per airline.
//!
//! - [`EasyJetAdapter`]: GraphQL search, one POST per departure day, three
//!   ranked "best offer" categories per answer, direct flights only.
//! - [`RyanAirAdapter`]: REST cheapest-per-day, one GET per window, route
//!   recovered from the request path.
//! - [`WizzAirAdapter`]: timetable POST per price type, carrying session
//!   cookies and a verification token captured from earlier responses.

mod easyjet;
mod ryanair;
mod wizzair;

use chrono::NaiveDate;
use fares_core::Company;
use reqwest::Url;

use crate::adapter::{BackendAdapter, ParseError};
use crate::error::ScraperError;
use crate::request::RawResponse;

pub use easyjet::EasyJetAdapter;
pub use ryanair::RyanAirAdapter;
pub use wizzair::{SessionState, WizzAirAdapter};

/// Builds the production adapter for `company`.
///
/// `session_max_in_flight` bounds concurrency for backends whose session
/// state benefits from converging before fanning out.
#[must_use]
pub fn adapter_for(company: Company, session_max_in_flight: usize) -> Box<dyn BackendAdapter> {
    match company {
        Company::EasyJet => Box::new(EasyJetAdapter::new()),
        Company::RyanAir => Box::new(RyanAirAdapter::new()),
        Company::WizzAir => Box::new(WizzAirAdapter::new(session_max_in_flight)),
    }
}

pub(crate) fn parse_endpoint(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url).map_err(|e| ScraperError::InvalidEndpoint {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Decodes a response body, mapping failure to a response-scoped error.
pub(crate) fn response_json(response: &RawResponse) -> Result<serde_json::Value, ParseError> {
    response.json().map_err(|e| ParseError::Body {
        url: response.url.to_string(),
        source: e,
    })
}

/// Reads the calendar date off an ISO timestamp such as
/// `"2026-11-03T06:25:00.000"` or `"2026-11-03T06:25:00Z"`.
pub(crate) fn flight_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}
