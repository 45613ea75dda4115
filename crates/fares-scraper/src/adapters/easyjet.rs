//! EasyJet fares via the Dohop GraphQL gateway.
//!
//! ## Observed response shape
//!
//! ```text
//! data.search.bestOffers: null
//!                       | { RECOMMENDED: Offer|null, QUICKEST: Offer|null, CHEAPEST: Offer|null }
//! Offer.itinerary.outbound[0] = { id, legs: [ { departure, origin.code, destination.code } ] }
//! ```
//!
//! `bestOffers` is `null` when the gateway has nothing for that day. The
//! three categories frequently point at the same underlying route, which is
//! why the route `id` is used as the offer key. Offers with more than one
//! leg are connecting itineraries and are dropped without comment; they are
//! common and not an error.
//!
//! The gateway sometimes answers with stations near the ones requested;
//! those are removed by station filtering downstream.

use chrono::NaiveDate;
use fares_core::{CanonicalOffer, Company};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::{flight_date, parse_endpoint, response_json};
use crate::adapter::{BackendAdapter, OfferKey, ParseError, ParsedResponse};
use crate::error::ScraperError;
use crate::request::{OutboundRequest, RawResponse};
use crate::schedule::ScrapeWindow;

const DEFAULT_ENDPOINT: &str = "https://gateway.prod.dohop.net/api/graphql";

const WINDOW_DAYS: u32 = 30;

/// The gateway copes with this many parallel searches without throttling.
const MAX_IN_FLIGHT: usize = 10;

/// Ranked categories the gateway returns in every answer.
const OFFER_TYPES: [&str; 3] = ["RECOMMENDED", "QUICKEST", "CHEAPEST"];

const SEARCH_QUERY: &str = "query searchResult($partner: Partner!, $origin: String!, \
$destination: String!, $passengerAges: [PositiveInt!]!, $metadata: Metadata!, \
$departureDateString: String!, $returnDateString: String, $sort: Sort, $limit: PositiveInt, \
$filters: OfferFiltersInput) { search(partner: $partner origin: $origin \
destination: $destination passengerAges: $passengerAges metadata: $metadata \
departureDateString: $departureDateString returnDateString: $returnDateString \
sort: $sort limit: $limit filters: $filters) { numberOfPages \
bestOffers { RECOMMENDED { ...Offer } QUICKEST { ...Offer } CHEAPEST { ...Offer } } \
offers { ...Offer } currency residency } } \
fragment Offer on Offer { id price pricePerPerson currency transferURL duration \
itinerary { ...Itinerary } } \
fragment Itinerary on Itinerary { outbound { ...Route } homebound { ...Route } } \
fragment Route on Route { id origin { code name city country } \
destination { code name city country } departure arrival duration \
operatingCarrier { name code flightNumber } marketingCarrier { name code flightNumber } \
legs { ...Leg } } \
fragment Leg on Leg { id duration origin { code name city country } \
destination { code name city country } departure arrival carrierType \
operatingCarrier { name code flightNumber } marketingCarrier { name code flightNumber } }";

#[derive(Debug, Deserialize)]
struct Offer {
    price: Decimal,
    currency: String,
    itinerary: Itinerary,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    outbound: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    id: String,
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    departure: String,
    origin: Station,
    destination: Station,
}

#[derive(Debug, Deserialize)]
struct Station {
    code: String,
}

pub struct EasyJetAdapter {
    endpoint: Url,
}

impl EasyJetAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default endpoint"),
        }
    }

    /// Points the adapter at a different GraphQL endpoint (e.g. a mock server).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidEndpoint`] if `endpoint` is not an absolute URL.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    fn search_request(&self, source: &str, destination: &str, day: NaiveDate) -> OutboundRequest {
        OutboundRequest::post_json(
            self.endpoint.clone(),
            json!({
                "query": SEARCH_QUERY,
                "variables": {
                    "partner": "easyjet",
                    "metadata": { "language": "en", "currency": "EUR" },
                    "origin": source,
                    "destination": destination,
                    "departureDateString": day.to_string(),
                    "returnDateString": null,
                    "passengerAges": [18],
                    "limit": 1
                }
            }),
        )
    }

    /// Converts one category's offer. `Ok(None)` means "filtered out", not
    /// an error.
    fn parse_offer(
        value: &serde_json::Value,
        scrape_date: NaiveDate,
    ) -> Result<Option<(OfferKey, CanonicalOffer)>, String> {
        // connecting itineraries are dropped before any field is required
        let leg_count = value
            .pointer("/itinerary/outbound/0/legs")
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len);
        if leg_count > 1 {
            return Ok(None);
        }

        let offer = Offer::deserialize(value).map_err(|e| e.to_string())?;
        let outbound = offer
            .itinerary
            .outbound
            .into_iter()
            .next()
            .ok_or("itinerary has no outbound route")?;
        let leg = outbound
            .legs
            .into_iter()
            .next()
            .ok_or("outbound route has no legs")?;
        let flight_date = flight_date(&leg.departure)
            .ok_or_else(|| format!("unparseable departure '{}'", leg.departure))?;

        Ok(Some((
            OfferKey::new(outbound.id),
            CanonicalOffer {
                flight_date,
                source: leg.origin.code,
                destination: leg.destination.code,
                price: offer.price,
                currency: offer.currency,
                company: Company::EasyJet,
                scrape_date,
            },
        )))
    }
}

impl Default for EasyJetAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendAdapter for EasyJetAdapter {
    fn company(&self) -> Company {
        Company::EasyJet
    }

    fn max_window_days(&self) -> u32 {
        WINDOW_DAYS
    }

    fn max_in_flight_hint(&self) -> Option<usize> {
        Some(MAX_IN_FLIGHT)
    }

    /// The search takes a single departure date, so each day of the window
    /// is its own request.
    fn build_requests(&self, window: &ScrapeWindow) -> Vec<OutboundRequest> {
        window
            .each_day()
            .map(|day| self.search_request(window.route.source(), window.route.destination(), day))
            .collect()
    }

    fn parse_response(
        &self,
        response: &RawResponse,
        scrape_date: NaiveDate,
    ) -> Result<ParsedResponse, ParseError> {
        let url = response.url.as_str();
        let body = response_json(response)?;

        let best_offers = body
            .pointer("/data/search")
            .and_then(|search| search.get("bestOffers"))
            .ok_or_else(|| ParseError::Response {
                url: url.to_owned(),
                reason: "missing data.search.bestOffers".to_owned(),
            })?;

        let mut parsed = ParsedResponse::empty();
        if best_offers.is_null() {
            return Ok(parsed);
        }

        for offer_type in OFFER_TYPES {
            match best_offers.get(offer_type) {
                None => parsed.push_error(url, offer_type, "category missing from bestOffers"),
                Some(serde_json::Value::Null) => {}
                Some(value) => match Self::parse_offer(value, scrape_date) {
                    Ok(Some((key, offer))) => parsed.push_offer(key, offer),
                    Ok(None) => {}
                    Err(reason) => parsed.push_error(url, offer_type, reason),
                },
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
#[path = "easyjet_test.rs"]
mod tests;
