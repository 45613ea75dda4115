//! WizzAir timetable search.
//!
//! The timetable endpoint expects the caller to carry the cookies it hands
//! out, and to echo the `RequestVerificationToken` cookie back as an
//! `X-RequestVerificationToken` header. The first request of a run goes out
//! with neither; the server establishes the session in its answer (even a
//! rejected one), and later requests pick it up.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use fares_core::{CanonicalOffer, Company};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE,
};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::{flight_date, parse_endpoint, response_json};
use crate::adapter::{BackendAdapter, OfferKey, ParseError, ParsedResponse};
use crate::error::ScraperError;
use crate::request::{OutboundRequest, RawResponse};
use crate::schedule::ScrapeWindow;

const DEFAULT_ENDPOINT: &str = "https://be.wizzair.com/17.4.0/Api/search/timetable";

const REFERER_URL: &str = "https://wizzair.com/en-gb/flights/timetable";

/// The API accepts up to 42 days; 30 leaves headroom.
const WINDOW_DAYS: u32 = 30;

const PRICE_TYPES: [&str; 1] = ["regular"];

const TOKEN_COOKIE: &str = "RequestVerificationToken";

const TOKEN_HEADER: &str = "x-requestverificationtoken";

/// Cookies captured from the backend during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    cookies: BTreeMap<String, String>,
}

impl SessionState {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Records every cookie set by `headers`. Only the leading `name=value`
    /// of each `Set-Cookie` is kept; attributes such as `Path` or `Expires`
    /// are not cookies. A later value for the same name replaces an earlier one.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for raw in headers.get_all(SET_COOKIE) {
            let Ok(raw) = raw.to_str() else {
                tracing::debug!("ignoring non-ASCII Set-Cookie header");
                continue;
            };
            let pair = raw.split(';').next().unwrap_or_default().trim();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    self.insert(name, value.trim());
                }
            }
        }
    }

    /// `Cookie` header value, or `None` before the session is established.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Flight {
    departure_station: String,
    arrival_station: String,
    departure_dates: Vec<String>,
    price: Price,
    #[serde(default)]
    price_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Price {
    amount: Decimal,
    currency_code: String,
}

pub struct WizzAirAdapter {
    endpoint: Url,
    session: Mutex<SessionState>,
    max_in_flight: usize,
}

impl WizzAirAdapter {
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default endpoint"),
            session: Mutex::new(SessionState::default()),
            max_in_flight,
        }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidEndpoint`] if `endpoint` is not an absolute URL.
    pub fn with_endpoint(endpoint: &str, max_in_flight: usize) -> Result<Self, ScraperError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            ..Self::new(max_in_flight)
        })
    }

    /// Replaces the current session, e.g. to resume with known cookies.
    #[must_use]
    pub fn with_session(self, state: SessionState) -> Self {
        *self.lock_session() = state;
        self
    }

    /// Snapshot of the session as it stands now.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.lock_session().clone()
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let session = self.lock_session();
        if let Some(token) = session.get(TOKEN_COOKIE) {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(TOKEN_HEADER), value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "verification token is not a valid header value");
                }
            }
        }
        if let Some(cookies) = session.cookie_header() {
            match HeaderValue::from_str(&cookies) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "session cookies are not a valid header value");
                }
            }
        }
        headers
    }
}

impl BackendAdapter for WizzAirAdapter {
    fn company(&self) -> Company {
        Company::WizzAir
    }

    fn max_window_days(&self) -> u32 {
        WINDOW_DAYS
    }

    fn max_in_flight_hint(&self) -> Option<usize> {
        Some(self.max_in_flight)
    }

    fn build_requests(&self, window: &ScrapeWindow) -> Vec<OutboundRequest> {
        let headers = self.headers();
        PRICE_TYPES
            .iter()
            .map(|price_type| {
                let body = json!({
                    "flightList": [{
                        "departureStation": window.route.source(),
                        "arrivalStation": window.route.destination(),
                        "from": window.start.to_string(),
                        "to": window.end.to_string()
                    }],
                    "priceType": price_type,
                    "adultCount": 1,
                    "childCount": 0,
                    "infantCount": 0
                });
                OutboundRequest::post_json(self.endpoint.clone(), body)
                    .with_headers(headers.clone())
            })
            .collect()
    }

    fn observe_headers(&self, headers: &HeaderMap) {
        let mut session = self.lock_session();
        let before = session.cookies.len();
        session.absorb(headers);
        if session.cookies.len() != before {
            tracing::debug!(cookies = session.cookies.len(), "session cookies updated");
        }
    }

    fn parse_response(
        &self,
        response: &RawResponse,
        scrape_date: NaiveDate,
    ) -> Result<ParsedResponse, ParseError> {
        let url = response.url.as_str();
        let body = response_json(response)?;
        let flights = body
            .get("outboundFlights")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| ParseError::Response {
                url: url.to_owned(),
                reason: "missing outboundFlights array".to_owned(),
            })?;

        let mut parsed = ParsedResponse::empty();
        for (i, raw) in flights.iter().enumerate() {
            let candidate = format!("outboundFlights[{i}]");
            let flight = match Flight::deserialize(raw) {
                Ok(flight) => flight,
                Err(e) => {
                    parsed.push_error(url, candidate, e.to_string());
                    continue;
                }
            };
            let Some(departure) = flight.departure_dates.first() else {
                parsed.push_error(url, candidate, "no departure dates");
                continue;
            };
            let Some(date) = flight_date(departure) else {
                parsed.push_error(
                    url,
                    candidate,
                    format!("unparseable departure date '{departure}'"),
                );
                continue;
            };

            let price_type = flight.price_type.as_deref().unwrap_or("regular");
            let key = format!(
                "{}-{}-{date}-{price_type}",
                flight.departure_station, flight.arrival_station
            );
            parsed.push_offer(
                OfferKey::new(key),
                CanonicalOffer {
                    flight_date: date,
                    source: flight.departure_station,
                    destination: flight.arrival_station,
                    price: flight.price.amount,
                    currency: flight.price.currency_code,
                    company: Company::WizzAir,
                    scrape_date,
                },
            );
        }

        Ok(parsed)
    }
}

#[cfg(test)]
#[path = "wizzair_test.rs"]
mod tests;
