//! Delivery seam between the crawl pipeline and whatever durably stores or
//! forwards accepted offers.

use std::future::Future;

use thiserror::Error;

use crate::offer::CanonicalOffer;

/// Errors raised by a [`Publisher`].
///
/// Any of these ends the crawl run: without a working sink there is no point
/// producing more offers.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("sink unreachable at {target}: {reason}")]
    Unreachable { target: String, reason: String },

    #[error("sink rejected offer with HTTP status {status}")]
    Rejected { status: u16 },

    #[error("failed to serialize offer: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write offer: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepts canonical offers for delivery.
///
/// Implementations verify their own connectivity before accepting work; the
/// pipeline calls [`Publisher::publish`] exactly once per accepted offer.
pub trait Publisher: Send + Sync {
    /// Delivers one offer.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the offer could not be handed off.
    fn publish(
        &self,
        offer: &CanonicalOffer,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}
