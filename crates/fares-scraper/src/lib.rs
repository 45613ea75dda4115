//! Crawling airline fare backends into canonical offers.

pub mod adapter;
pub mod adapters;
pub mod crawl;
pub mod error;
pub mod failure;
pub mod normalize;
pub mod request;
mod retry;
pub mod schedule;
pub mod transport;

pub use adapter::{BackendAdapter, OfferKey, ParseError, ParsedResponse};
pub use adapters::{adapter_for, EasyJetAdapter, RyanAirAdapter, SessionState, WizzAirAdapter};
pub use crawl::{crawl, CrawlError, CrawlOptions, CrawlSummary};
pub use error::ScraperError;
pub use failure::{FailureKind, TransportFailure};
pub use normalize::OfferNormalizer;
pub use request::{OutboundRequest, RawResponse};
pub use schedule::{DateWindow, DateWindows, ScrapeWindow, WindowScheduler};
pub use transport::{HeaderObserver, HttpTransport, Transport};
