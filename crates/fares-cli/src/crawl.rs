//! The `crawl` command: every selected backend runs concurrently, each with
//! its own adapter (and so its own session), sharing one transport and one
//! publisher.

use std::sync::Arc;

use anyhow::Context;
use fares_core::{AppConfig, Company, Publisher, RouteCatalog};
use fares_publish::Sink;
use fares_scraper::{
    adapter_for, crawl, BackendAdapter, CrawlError, CrawlOptions, CrawlSummary, HttpTransport,
    Transport,
};
use tokio::sync::watch;
use tracing::Instrument;

/// Backends to crawl: the requested ones in order without repeats, or all
/// of them.
pub(crate) fn select_companies(requested: &[Company]) -> Vec<Company> {
    if requested.is_empty() {
        return Company::ALL.to_vec();
    }
    let mut selected = Vec::with_capacity(requested.len());
    for company in requested {
        if !selected.contains(company) {
            selected.push(*company);
        }
    }
    selected
}

/// Runs the crawl.
///
/// # Errors
///
/// Returns an error if the sink or transport cannot be set up, if any
/// backend's publisher fails, or if no selected backend has a usable route.
pub(crate) async fn run_crawl(
    config: &AppConfig,
    requested: &[Company],
    days: Option<u32>,
) -> anyhow::Result<()> {
    let companies = select_companies(requested);
    let catalogs = fares_core::load_catalogs(&config.routes_path);
    let empty = RouteCatalog::default();

    let publisher = Sink::open(&config.sink, config.request_timeout_secs, &config.user_agent)
        .await
        .context("publisher is not usable")?;
    let transport = HttpTransport::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .context("failed to build HTTP transport")?;

    let shutdown = Arc::new(watch::channel(false).0);
    let on_signal = Arc::clone(&shutdown);
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.send_replace(true);
    });

    let options = CrawlOptions {
        horizon_days: days.unwrap_or(config.days_to_scrape),
        max_in_flight: config.max_in_flight,
        today: chrono::Local::now().date_naive(),
    };

    let adapters: Vec<_> = companies
        .iter()
        .map(|&company| adapter_for(company, config.session_max_in_flight))
        .collect();
    let backends: Vec<_> = adapters
        .iter()
        .map(|adapter| {
            let catalog = catalogs.get(&adapter.company()).unwrap_or(&empty);
            (adapter.as_ref(), catalog)
        })
        .collect();
    let results = crawl_backends(&backends, &transport, &publisher, &options, &shutdown).await;

    let mut failed = Vec::new();
    for (company, result) in results {
        if let Err(e) = result {
            tracing::error!(%company, error = %e, "crawl failed");
            failed.push(company.to_string());
        }
    }
    if !failed.is_empty() {
        anyhow::bail!("crawl failed for: {}", failed.join(", "));
    }

    if companies
        .iter()
        .all(|c| catalogs.get(c).is_none_or(RouteCatalog::is_empty))
    {
        anyhow::bail!(
            "configuration error: no valid routes in {} for any selected backend",
            config.routes_path.display()
        );
    }

    Ok(())
}

/// Crawls every backend concurrently, one span per run.
///
/// A publisher failure in any run flips `shutdown`, so the others stop
/// issuing requests instead of feeding a broken sink.
pub(crate) async fn crawl_backends<T, P>(
    backends: &[(&dyn BackendAdapter, &RouteCatalog)],
    transport: &T,
    publisher: &P,
    options: &CrawlOptions,
    shutdown: &watch::Sender<bool>,
) -> Vec<(Company, Result<CrawlSummary, CrawlError>)>
where
    T: Transport,
    P: Publisher,
{
    let runs = backends.iter().map(|&(adapter, catalog)| {
        let company = adapter.company();
        let span = tracing::info_span!("crawl", run_id = %uuid::Uuid::new_v4(), %company);
        async move {
            let result =
                crawl(adapter, transport, publisher, catalog, options, shutdown.subscribe()).await;
            if let Err(CrawlError::Publish(e)) = &result {
                tracing::error!(%company, error = %e, "publisher failed, stopping every backend");
                shutdown.send_replace(true);
            }
            (company, result)
        }
        .instrument(span)
    });
    futures::future::join_all(runs).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, no further requests will be issued");
}
