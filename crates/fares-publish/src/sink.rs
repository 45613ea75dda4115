use fares_core::{CanonicalOffer, PublishError, Publisher, SinkConfig};

use crate::http::HttpPublisher;
use crate::jsonl::JsonLinesPublisher;

/// The configured publisher.
pub enum Sink {
    JsonLines(JsonLinesPublisher),
    Http(HttpPublisher),
}

impl Sink {
    /// Opens the sink described by `config`, verifying it is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unreachable`] if the file cannot be opened or
    /// the HTTP endpoint does not answer.
    pub async fn open(
        config: &SinkConfig,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, PublishError> {
        match config {
            SinkConfig::Stdout => Ok(Self::JsonLines(JsonLinesPublisher::stdout())),
            SinkConfig::File(path) => JsonLinesPublisher::append_to(path).map(Self::JsonLines),
            SinkConfig::Http(url) => HttpPublisher::connect(url, timeout_secs, user_agent)
                .await
                .map(Self::Http),
        }
    }
}

impl Publisher for Sink {
    async fn publish(&self, offer: &CanonicalOffer) -> Result<(), PublishError> {
        match self {
            Self::JsonLines(publisher) => publisher.publish(offer).await,
            Self::Http(publisher) => publisher.publish(offer).await,
        }
    }
}
