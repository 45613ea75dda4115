//! Offline commands: `routes` and `schedule`. Nothing here touches the network.

use chrono::NaiveDate;
use fares_core::{AppConfig, Company, RouteCatalog};
use fares_scraper::{adapter_for, BackendAdapter, WindowScheduler};

pub(crate) fn print_routes(config: &AppConfig) {
    let catalogs = fares_core::load_catalogs(&config.routes_path);
    for company in Company::ALL {
        let Some(catalog) = catalogs.get(&company) else {
            println!("{company}: no routes");
            continue;
        };
        println!(
            "{company}: {} routes, {} stations",
            catalog.len(),
            catalog.stations().len()
        );
        for route in catalog.routes() {
            println!("  {route} (and {})", route.reversed());
        }
    }
}

/// Prints what a crawl of `company` would issue today.
///
/// # Errors
///
/// Returns an error if the adapter's window size is unusable.
pub(crate) fn print_schedule(
    config: &AppConfig,
    company: Company,
    days: Option<u32>,
) -> anyhow::Result<()> {
    let catalogs = fares_core::load_catalogs(&config.routes_path);
    let catalog = catalogs.get(&company).cloned().unwrap_or_default();
    let adapter = adapter_for(company, config.session_max_in_flight);
    let horizon = days.unwrap_or(config.days_to_scrape);
    let today = chrono::Local::now().date_naive();

    for line in schedule_lines(adapter.as_ref(), &catalog, horizon, today)? {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn schedule_lines(
    adapter: &dyn BackendAdapter,
    catalog: &RouteCatalog,
    horizon_days: u32,
    today: NaiveDate,
) -> anyhow::Result<Vec<String>> {
    let scheduler = WindowScheduler::new(horizon_days, adapter.max_window_days())?;
    let mut lines = Vec::new();
    let mut requests = 0usize;
    let mut windows = 0usize;

    for window in scheduler.schedule(catalog, today) {
        windows += 1;
        lines.push(format!(
            "{} {}..{} ({} days)",
            window.route,
            window.start,
            window.end,
            window.days()
        ));
        for request in adapter.build_requests(&window) {
            requests += 1;
            lines.push(format!("  {} {}", request.method, request.url));
        }
    }
    lines.push(format!(
        "{}: {windows} windows, {requests} requests over {horizon_days} days from {today}",
        adapter.company()
    ));
    Ok(lines)
}
