//! RyanAir "cheapest per day" fare finder.
//!
//! One GET covers a whole window:
//!
//! ```text
//! GET {base}{SRC}/{DST}/cheapestPerDay?outboundDateFrom=YYYY-MM-DD&outboundDateTo=YYYY-MM-DD
//! ```
//!
//! The answer lists one fare per calendar day under `outbound.fares`, but
//! never repeats which stations were asked for. The route is therefore read
//! back from the path of the originating request.

use chrono::NaiveDate;
use fares_core::{CanonicalOffer, Company};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{flight_date, parse_endpoint, response_json};
use crate::adapter::{BackendAdapter, OfferKey, ParseError, ParsedResponse};
use crate::error::ScraperError;
use crate::request::{OutboundRequest, RawResponse};
use crate::schedule::ScrapeWindow;

const DEFAULT_BASE: &str = "https://www.ryanair.com/api/farfnd/3/oneWayFares/";

const WINDOW_DAYS: u32 = 30;

const CHEAPEST_PER_DAY: &str = "cheapestPerDay";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fare {
    departure_date: String,
    price: Price,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Price {
    value: Decimal,
    currency_code: String,
}

pub struct RyanAirAdapter {
    base: Url,
}

impl RyanAirAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE).expect("valid default base URL"),
        }
    }

    /// Uses `base` as the fare-finder root; a trailing slash is added if
    /// missing so station codes append as path segments.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidEndpoint`] if `base` is not an absolute URL.
    pub fn with_base(base: &str) -> Result<Self, ScraperError> {
        let base = if base.ends_with('/') {
            base.to_owned()
        } else {
            format!("{base}/")
        };
        Ok(Self {
            base: parse_endpoint(&base)?,
        })
    }

    fn window_url(&self, window: &ScrapeWindow) -> Option<Url> {
        let path = format!(
            "{}/{}/{CHEAPEST_PER_DAY}",
            window.route.source(),
            window.route.destination()
        );
        let mut url = self.base.join(&path).ok()?;
        url.query_pairs_mut()
            .append_pair("outboundDateFrom", &window.start.to_string())
            .append_pair("outboundDateTo", &window.end.to_string());
        Some(url)
    }
}

impl Default for RyanAirAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `(source, destination)` from the two path segments preceding
/// `cheapestPerDay`.
fn route_from_url(url: &Url) -> Option<(String, String)> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let idx = segments.iter().position(|s| *s == CHEAPEST_PER_DAY)?;
    let source = segments.get(idx.checked_sub(2)?)?;
    let destination = segments.get(idx - 1)?;
    if source.is_empty() || destination.is_empty() {
        return None;
    }
    Some(((*source).to_owned(), (*destination).to_owned()))
}

impl BackendAdapter for RyanAirAdapter {
    fn company(&self) -> Company {
        Company::RyanAir
    }

    fn max_window_days(&self) -> u32 {
        WINDOW_DAYS
    }

    fn build_requests(&self, window: &ScrapeWindow) -> Vec<OutboundRequest> {
        match self.window_url(window) {
            Some(url) => vec![OutboundRequest::get(url)],
            None => {
                tracing::error!(route = %window.route, "could not build fare finder URL");
                Vec::new()
            }
        }
    }

    fn parse_response(
        &self,
        response: &RawResponse,
        scrape_date: NaiveDate,
    ) -> Result<ParsedResponse, ParseError> {
        let url = response.url.as_str();
        let (source, destination) =
            route_from_url(&response.url).ok_or_else(|| ParseError::Response {
                url: url.to_owned(),
                reason: format!("request path has no SRC/DST before {CHEAPEST_PER_DAY}"),
            })?;

        let body = response_json(response)?;
        let fares = body
            .pointer("/outbound/fares")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| ParseError::Response {
                url: url.to_owned(),
                reason: "missing outbound.fares array".to_owned(),
            })?;

        let mut parsed = ParsedResponse::empty();
        for (i, raw) in fares.iter().enumerate() {
            let candidate = format!("fares[{i}]");
            match raw.get("unavailable").and_then(serde_json::Value::as_bool) {
                None => {
                    parsed.push_error(url, candidate, "missing 'unavailable' flag");
                    continue;
                }
                Some(true) => continue,
                Some(false) => {}
            }

            let fare = match Fare::deserialize(raw) {
                Ok(fare) => fare,
                Err(e) => {
                    parsed.push_error(url, candidate, e.to_string());
                    continue;
                }
            };
            let Some(date) = flight_date(&fare.departure_date) else {
                parsed.push_error(
                    url,
                    candidate,
                    format!("unparseable departureDate '{}'", fare.departure_date),
                );
                continue;
            };

            parsed.push_offer(
                OfferKey::new(format!("{source}-{destination}-{date}")),
                CanonicalOffer {
                    flight_date: date,
                    source: source.clone(),
                    destination: destination.clone(),
                    price: fare.price.value,
                    currency: fare.price.currency_code,
                    company: Company::RyanAir,
                    scrape_date,
                },
            );
        }

        Ok(parsed)
    }
}
