//! Window scheduling: turns a scrape horizon into the ordered list of
//! `(route, start, end)` requests each backend must cover.
//!
//! Windows start today and advance in consecutive, non-overlapping steps of
//! `window_days`. Dates are inclusive, so a 30-day window starting on the 1st
//! ends on the 30th. The last window is clipped to the final day of the
//! horizon. For `H` horizon days and `W`-day windows this yields
//! `ceil(H / W)` windows.
//!
//! Ordering is window-major, then catalog order, then direction (as listed,
//! then reversed). The backends do not care, but tests and logs do.

use chrono::{Days, NaiveDate};
use fares_core::{Route, RouteCatalog};

use crate::error::ScraperError;

/// A span of calendar days, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One directed route over one date window; consumed once by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeWindow {
    pub route: Route,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScrapeWindow {
    /// Number of calendar days covered, counting both ends.
    #[must_use]
    pub fn days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Every calendar day in the window, in order.
    pub fn each_day(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowScheduler {
    horizon_days: u32,
    window_days: u32,
}

impl WindowScheduler {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidWindow`] when `window_days` is zero.
    pub fn new(horizon_days: u32, window_days: u32) -> Result<Self, ScraperError> {
        if window_days == 0 {
            return Err(ScraperError::InvalidWindow);
        }
        Ok(Self {
            horizon_days,
            window_days,
        })
    }

    /// The date windows covering `[today, today + horizon_days)`.
    #[must_use]
    pub fn date_windows(&self, today: NaiveDate) -> DateWindows {
        DateWindows {
            today,
            horizon_days: u64::from(self.horizon_days),
            window_days: u64::from(self.window_days),
            offset: 0,
        }
    }

    /// Lazily yields every [`ScrapeWindow`] for `catalog`, both directions of
    /// every route. Calling again restarts from the beginning.
    pub fn schedule<'a>(
        &self,
        catalog: &'a RouteCatalog,
        today: NaiveDate,
    ) -> impl Iterator<Item = ScrapeWindow> + Send + 'a {
        self.date_windows(today).flat_map(move |window| {
            catalog.routes().iter().flat_map(move |route| {
                [route.clone(), route.reversed()].map(|route| ScrapeWindow {
                    route,
                    start: window.start,
                    end: window.end,
                })
            })
        })
    }
}

/// Iterator over the date windows of one horizon.
#[derive(Debug, Clone)]
pub struct DateWindows {
    today: NaiveDate,
    horizon_days: u64,
    window_days: u64,
    offset: u64,
}

impl Iterator for DateWindows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.horizon_days {
            return None;
        }
        let last_offset = (self.offset + self.window_days).min(self.horizon_days) - 1;
        let start = self.today.checked_add_days(Days::new(self.offset))?;
        let end = self.today.checked_add_days(Days::new(last_offset))?;
        self.offset += self.window_days;
        Some(DateWindow { start, end })
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
