//! The crawl pipeline for one backend: schedule → request → parse →
//! normalize → publish.
//!
//! Windows are pulled from the scheduler lazily, only when a concurrency slot
//! frees up, so a session-stateful adapter builds each request from the
//! freshest cookies it has seen. Transport and parse failures are logged and
//! counted; only a publisher failure ends the run early.

use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::NaiveDate;
use fares_core::{CanonicalOffer, PublishError, Publisher, RouteCatalog};
use futures::{future, stream, StreamExt};
use reqwest::header::HeaderMap;
use thiserror::Error;
use tokio::sync::watch;

use crate::adapter::BackendAdapter;
use crate::error::ScraperError;
use crate::normalize::OfferNormalizer;
use crate::request::OutboundRequest;
use crate::schedule::WindowScheduler;
use crate::transport::Transport;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("publisher failed: {0}")]
    Publish(#[from] PublishError),

    #[error("cannot schedule crawl: {0}")]
    Schedule(#[from] ScraperError),
}

#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    /// Days ahead of `today` to cover.
    pub horizon_days: u32,
    /// Crawl-wide request concurrency; an adapter hint may lower it.
    pub max_in_flight: usize,
    /// First departure date scheduled; also stamped as the offers' scrape date.
    pub today: NaiveDate,
}

/// Counters for one finished (or cancelled) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub windows: usize,
    pub requests: usize,
    pub responses: usize,
    pub offers_published: usize,
    pub offers_rejected: usize,
    pub parse_errors: usize,
    pub transport_failures: usize,
    /// Set when shutdown stopped the run before every window was issued.
    pub cancelled: bool,
}

impl CrawlSummary {
    fn record(&mut self, outcome: &RequestOutcome) {
        self.requests += 1;
        self.responses += usize::from(outcome.responded);
        self.offers_published += outcome.published;
        self.offers_rejected += outcome.rejected;
        self.parse_errors += outcome.parse_errors;
        self.transport_failures += usize::from(outcome.transport_failed);
    }
}

#[derive(Debug, Default)]
struct RequestOutcome {
    responded: bool,
    transport_failed: bool,
    parse_errors: usize,
    rejected: usize,
    published: usize,
}

/// Crawls every route in `catalog` through `adapter`.
///
/// Once `shutdown` turns `true`, no further requests are issued; requests
/// already in flight run to completion and their offers are still published.
///
/// # Errors
///
/// Returns [`CrawlError::Publish`] on the first publisher failure, and
/// [`CrawlError::Schedule`] if the adapter reports a zero-day window size.
pub async fn crawl<T, P>(
    adapter: &dyn BackendAdapter,
    transport: &T,
    publisher: &P,
    catalog: &RouteCatalog,
    options: &CrawlOptions,
    shutdown: watch::Receiver<bool>,
) -> Result<CrawlSummary, CrawlError>
where
    T: Transport,
    P: Publisher,
{
    let company = adapter.company();
    let mut summary = CrawlSummary::default();

    if catalog.is_empty() {
        tracing::error!(%company, "configuration error: no valid routes, nothing to crawl");
        return Ok(summary);
    }

    let scheduler = WindowScheduler::new(options.horizon_days, adapter.max_window_days())?;
    let in_flight = adapter
        .max_in_flight_hint()
        .map_or(options.max_in_flight, |hint| hint.min(options.max_in_flight))
        .max(1);

    tracing::info!(
        %company,
        days_ahead = options.horizon_days,
        start_date = %options.today,
        window_days = adapter.max_window_days(),
        in_flight,
        "starting crawl"
    );
    for route in catalog.routes() {
        tracing::info!(%company, route = %route, "scraping route in both directions");
    }

    let normalizer = OfferNormalizer::for_catalog(catalog);
    let windows = AtomicUsize::new(0);
    let cancelled = AtomicBool::new(false);
    let keep_going = || {
        let stop = *shutdown.borrow();
        if stop {
            cancelled.store(true, Ordering::Relaxed);
        }
        future::ready(!stop)
    };

    let outcomes = stream::iter(scheduler.schedule(catalog, options.today))
        .take_while(|_| keep_going())
        .map(|window| {
            windows.fetch_add(1, Ordering::Relaxed);
            let requests = adapter.build_requests(&window);
            tracing::debug!(
                route = %window.route,
                start = %window.start,
                end = %window.end,
                requests = requests.len(),
                "scheduled window"
            );
            stream::iter(requests)
        })
        .flatten()
        .take_while(|_| keep_going())
        .map(|request| {
            process_request(adapter, transport, publisher, &normalizer, request, options.today)
        })
        .buffer_unordered(in_flight);
    let mut outcomes = pin!(outcomes);

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                tracing::error!(%company, error = %e, "publisher failed, aborting run");
                return Err(CrawlError::Publish(e));
            }
        }
    }

    summary.windows = windows.load(Ordering::Relaxed);
    summary.cancelled = cancelled.load(Ordering::Relaxed);
    if summary.cancelled {
        tracing::warn!(
            %company,
            windows = summary.windows,
            "crawl cancelled before all windows were issued"
        );
    }
    tracing::info!(
        %company,
        windows = summary.windows,
        requests = summary.requests,
        responses = summary.responses,
        published = summary.offers_published,
        rejected = summary.offers_rejected,
        parse_errors = summary.parse_errors,
        transport_failures = summary.transport_failures,
        "crawl finished"
    );
    Ok(summary)
}

async fn process_request<T, P>(
    adapter: &dyn BackendAdapter,
    transport: &T,
    publisher: &P,
    normalizer: &OfferNormalizer,
    request: OutboundRequest,
    scrape_date: NaiveDate,
) -> Result<RequestOutcome, PublishError>
where
    T: Transport,
    P: Publisher,
{
    let mut outcome = RequestOutcome::default();

    // every attempt's headers, rejections included, may carry session cookies
    let observe = |headers: &HeaderMap| adapter.observe_headers(headers);
    let response = match transport.execute(request, &observe).await {
        Ok(response) => response,
        Err(failure) => {
            failure.report();
            outcome.transport_failed = true;
            return Ok(outcome);
        }
    };
    outcome.responded = true;

    let parsed = match adapter.parse_response(&response, scrape_date) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(url = %response.url, error = %e, "discarding response");
            outcome.parse_errors = 1;
            return Ok(outcome);
        }
    };
    for e in &parsed.errors {
        tracing::error!(error = %e, "discarding candidate");
    }
    outcome.parse_errors = parsed.errors.len();

    let candidates = parsed.offers.len();
    tracing::info!(url = %response.url, candidates, "received offers");

    let accepted: Vec<CanonicalOffer> = normalizer.accept_all(parsed.offers);
    outcome.rejected = candidates - accepted.len();
    for offer in &accepted {
        publisher.publish(offer).await?;
        outcome.published += 1;
    }
    Ok(outcome)
}
