use std::time::Duration;

use fares_core::{CanonicalOffer, PublishError, Publisher};
use reqwest::{Client, Url};

/// POSTs each offer as a JSON object to a collector endpoint.
///
/// Use [`HttpPublisher::connect`]: it refuses to hand back a publisher for an
/// endpoint that cannot be reached, so a misconfigured sink fails before any
/// crawling starts.
pub struct HttpPublisher {
    client: Client,
    endpoint: Url,
}

impl HttpPublisher {
    /// Builds the publisher and probes `endpoint` with a `GET`.
    ///
    /// Any HTTP answer, whatever its status, counts as reachable; only a
    /// failure to connect is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unreachable`] if `endpoint` is not a valid URL,
    /// the client cannot be built, or the probe gets no answer.
    pub async fn connect(
        endpoint: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, PublishError> {
        let unreachable = |reason: String| PublishError::Unreachable {
            target: endpoint.to_owned(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| unreachable(format!("invalid URL: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| unreachable(e.to_string()))?;

        let probe = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        tracing::info!(status = probe.status().as_u16(), "publish endpoint reachable");

        Ok(Self {
            client,
            endpoint: url,
        })
    }
}

impl Publisher for HttpPublisher {
    async fn publish(&self, offer: &CanonicalOffer) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(offer)
            .send()
            .await
            .map_err(|e| PublishError::Unreachable {
                target: self.endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
