//! Publishers for canonical offers.
//!
//! - [`JsonLinesPublisher`]: one flat JSON object per line, to stdout or a file.
//! - [`HttpPublisher`]: POSTs each offer to a collector endpoint, probed once
//!   at startup.
//! - [`Sink`]: whichever of the above `FARES_SINK` selects.

mod http;
mod jsonl;
mod sink;

pub use http::HttpPublisher;
pub use jsonl::JsonLinesPublisher;
pub use sink::Sink;
