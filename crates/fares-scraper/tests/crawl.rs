//! End-to-end tests for `crawl` against mocked backends.
//!
//! Each test points a real adapter at a `wiremock` server and collects what
//! reaches the publisher.

use std::sync::Mutex;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::watch;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fares_core::{CanonicalOffer, Company, PublishError, Publisher, Route, RouteCatalog};
use fares_scraper::{
    crawl, CrawlError, CrawlOptions, EasyJetAdapter, HttpTransport, RyanAirAdapter, WizzAirAdapter,
};

#[derive(Default)]
struct Collecting {
    offers: Mutex<Vec<CanonicalOffer>>,
}

impl Collecting {
    fn offers(&self) -> Vec<CanonicalOffer> {
        self.offers.lock().unwrap().clone()
    }
}

impl Publisher for Collecting {
    async fn publish(&self, offer: &CanonicalOffer) -> Result<(), PublishError> {
        self.offers.lock().unwrap().push(offer.clone());
        Ok(())
    }
}

struct Failing;

impl Publisher for Failing {
    async fn publish(&self, _offer: &CanonicalOffer) -> Result<(), PublishError> {
        Err(PublishError::Rejected { status: 503 })
    }
}

/// Requests shutdown as soon as the first offer is delivered.
struct CancelAfterFirst {
    shutdown: watch::Sender<bool>,
    inner: Collecting,
}

impl Publisher for CancelAfterFirst {
    async fn publish(&self, offer: &CanonicalOffer) -> Result<(), PublishError> {
        self.shutdown.send_replace(true);
        self.inner.publish(offer).await
    }
}

fn transport() -> HttpTransport {
    HttpTransport::new(5, "fares-test/0.1", 0, 0).expect("failed to build test transport")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()
}

fn options(horizon_days: u32, max_in_flight: usize) -> CrawlOptions {
    CrawlOptions {
        horizon_days,
        max_in_flight,
        today: today(),
    }
}

fn catalog(source: &str, destination: &str) -> RouteCatalog {
    RouteCatalog::new([Route::new(source, destination).unwrap()])
}

fn running() -> watch::Receiver<bool> {
    // the sender is dropped; the last value stays readable
    watch::channel(false).1
}

fn ryanair_fares() -> Value {
    json!({
        "outbound": { "fares": [
            { "day": "2026-11-01", "departureDate": null, "price": null, "unavailable": true },
            { "day": "2026-11-02", "departureDate": "2026-11-02T06:10:00",
              "price": { "value": 19.99, "currencyCode": "EUR" }, "unavailable": false },
            { "day": "2026-11-03", "departureDate": null, "price": null, "unavailable": true },
            { "day": "2026-11-04", "departureDate": "2026-11-04T21:45:00",
              "price": { "value": 34.5, "currencyCode": "EUR" }, "unavailable": false },
            { "day": "2026-11-05", "departureDate": null, "price": null, "unavailable": true }
        ]}
    })
}

async fn ryanair_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/farfnd/BGY/OTP/cheapestPerDay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ryanair_fares()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farfnd/OTP/BGY/cheapestPerDay"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

fn ryanair(server: &MockServer) -> RyanAirAdapter {
    RyanAirAdapter::with_base(&format!("{}/farfnd", server.uri())).unwrap()
}

// ---------------------------------------------------------------------------
// Day-granular REST backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ryanair_publishes_available_days_and_survives_failed_direction() {
    let server = ryanair_server().await;
    let publisher = Collecting::default();

    let summary = crawl(
        &ryanair(&server),
        &transport(),
        &publisher,
        &catalog("BGY", "OTP"),
        &options(10, 4),
        running(),
    )
    .await
    .expect("crawl should succeed");

    assert_eq!(summary.windows, 2);
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.responses, 1);
    assert_eq!(summary.transport_failures, 1);
    assert_eq!(summary.offers_published, 2);
    assert!(!summary.cancelled);

    let offers = publisher.offers();
    assert_eq!(offers.len(), 2);
    for offer in &offers {
        assert_eq!(offer.source, "BGY");
        assert_eq!(offer.destination, "OTP");
        assert_eq!(offer.company, Company::RyanAir);
        assert_eq!(offer.scrape_date, today());
    }
}

#[tokio::test]
async fn publish_failure_aborts_the_run() {
    let server = ryanair_server().await;

    let result = crawl(
        &ryanair(&server),
        &transport(),
        &Failing,
        &catalog("BGY", "OTP"),
        &options(10, 4),
        running(),
    )
    .await;

    assert!(matches!(result, Err(CrawlError::Publish(PublishError::Rejected { status: 503 }))));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_before_start_issues_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_tx, rx) = watch::channel(true);
    let summary = crawl(
        &ryanair(&server),
        &transport(),
        &Collecting::default(),
        &catalog("BGY", "OTP"),
        &options(60, 4),
        rx,
    )
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.windows, 0);
    assert_eq!(summary.requests, 0);
}

#[tokio::test]
async fn shutdown_mid_run_lets_in_flight_request_finish() {
    let server = ryanair_server().await;
    let (tx, rx) = watch::channel(false);
    let publisher = CancelAfterFirst {
        shutdown: tx,
        inner: Collecting::default(),
    };

    // 60 days in 30-day windows, both directions: four windows scheduled
    let summary = crawl(
        &ryanair(&server),
        &transport(),
        &publisher,
        &catalog("BGY", "OTP"),
        &options(60, 1),
        rx,
    )
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.windows, 1);
    assert_eq!(summary.requests, 1);
    // both offers of the in-flight response still went out
    assert_eq!(publisher.inner.offers().len(), 2);
}

// ---------------------------------------------------------------------------
// GraphQL backend
// ---------------------------------------------------------------------------

fn easyjet_offer(id: &str, origin: &str, destination: &str) -> Value {
    json!({
        "id": format!("offer-{id}"),
        "price": 39.99,
        "currency": "EUR",
        "itinerary": { "outbound": [{
            "id": id,
            "legs": [{
                "departure": "2026-11-01T06:25:00Z",
                "origin": { "code": origin },
                "destination": { "code": destination }
            }]
        }]}
    })
}

#[tokio::test]
async fn easyjet_dedupes_categories_and_filters_foreign_stations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "search": { "bestOffers": {
                "RECOMMENDED": easyjet_offer("r1", "GVA", "OTP"),
                "QUICKEST": easyjet_offer("r2", "BSL", "OTP"),
                "CHEAPEST": easyjet_offer("r1", "GVA", "OTP")
            }}}
        })))
        .expect(4)
        .mount(&server)
        .await;

    let adapter = EasyJetAdapter::with_endpoint(&format!("{}/graphql", server.uri())).unwrap();
    let publisher = Collecting::default();
    // two days, both directions, one request per day
    let summary = crawl(
        &adapter,
        &transport(),
        &publisher,
        &catalog("GVA", "OTP"),
        &options(2, 16),
        running(),
    )
    .await
    .unwrap();

    assert_eq!(summary.requests, 4);
    assert_eq!(summary.offers_published, 4);
    assert_eq!(summary.offers_rejected, 8);
    assert_eq!(summary.parse_errors, 0);
    assert!(publisher.offers().iter().all(|o| o.source == "GVA"));
}

#[tokio::test]
async fn null_best_offers_publishes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "search": { "bestOffers": null } } })),
        )
        .mount(&server)
        .await;

    let adapter = EasyJetAdapter::with_endpoint(&server.uri()).unwrap();
    let summary = crawl(
        &adapter,
        &transport(),
        &Collecting::default(),
        &catalog("GVA", "OTP"),
        &options(1, 16),
        running(),
    )
    .await
    .unwrap();

    assert_eq!(summary.responses, 2);
    assert_eq!(summary.offers_published, 0);
    assert_eq!(summary.parse_errors, 0);
}

#[tokio::test]
async fn malformed_response_is_counted_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let adapter = EasyJetAdapter::with_endpoint(&server.uri()).unwrap();
    let summary = crawl(
        &adapter,
        &transport(),
        &Collecting::default(),
        &catalog("GVA", "OTP"),
        &options(1, 16),
        running(),
    )
    .await
    .unwrap();

    assert_eq!(summary.responses, 2);
    assert_eq!(summary.parse_errors, 2);
}

// ---------------------------------------------------------------------------
// Session-stateful backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wizzair_session_from_rejection_reaches_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/timetable"))
        .and(header("x-requestverificationtoken", "tok-1"))
        .and(header("cookie", "RequestVerificationToken=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outboundFlights": [{
                "departureStation": "OTP",
                "arrivalStation": "LTN",
                "departureDates": ["2026-11-03T06:00:00"],
                "price": { "amount": 29.99, "currencyCode": "EUR" },
                "priceType": "price"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/timetable"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("set-cookie", "RequestVerificationToken=tok-1; path=/; secure"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/timetable", server.uri());
    let adapter = WizzAirAdapter::with_endpoint(&endpoint, 1).unwrap();
    let publisher = Collecting::default();
    let summary = crawl(
        &adapter,
        &transport(),
        &publisher,
        &catalog("LTN", "OTP"),
        &options(10, 16),
        running(),
    )
    .await
    .unwrap();

    assert_eq!(summary.requests, 2);
    assert_eq!(summary.transport_failures, 1);
    assert_eq!(summary.offers_published, 1);
    assert_eq!(adapter.session().get("RequestVerificationToken"), Some("tok-1"));
    assert_eq!(publisher.offers()[0].company, Company::WizzAir);
}

#[tokio::test]
async fn wizzair_session_from_retried_rejection_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/timetable"))
        .and(header("x-requestverificationtoken", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outboundFlights": [{
                "departureStation": "OTP",
                "arrivalStation": "LTN",
                "departureDates": ["2026-11-03T06:00:00"],
                "price": { "amount": 29.99, "currencyCode": "EUR" },
                "priceType": "price"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/timetable"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("set-cookie", "RequestVerificationToken=tok-1; path=/"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/timetable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "outboundFlights": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/timetable", server.uri());
    let adapter = WizzAirAdapter::with_endpoint(&endpoint, 1).unwrap();
    let retrying = HttpTransport::new(5, "fares-test/0.1", 1, 0).unwrap();
    let publisher = Collecting::default();
    let summary = crawl(
        &adapter,
        &retrying,
        &publisher,
        &catalog("LTN", "OTP"),
        &options(10, 16),
        running(),
    )
    .await
    .unwrap();

    // the 503 was retried to success, yet its cookie still reached the session
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.transport_failures, 0);
    assert_eq!(adapter.session().get("RequestVerificationToken"), Some("tok-1"));
    assert_eq!(summary.offers_published, 1);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_catalog_runs_zero_windows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = crawl(
        &ryanair(&server),
        &transport(),
        &Collecting::default(),
        &RouteCatalog::default(),
        &options(60, 4),
        running(),
    )
    .await
    .unwrap();

    assert_eq!(summary.windows, 0);
    assert_eq!(summary.requests, 0);
    assert!(!summary.cancelled);
}
