//! Request execution.
//!
//! The pipeline only sees [`Transport`]; [`HttpTransport`] is the reqwest
//! implementation with timeout, user agent, and retry policy applied.

use std::future::Future;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Client;

use crate::error::ScraperError;
use crate::failure::TransportFailure;
use crate::request::{OutboundRequest, RawResponse};
use crate::retry::retry_with_backoff;

/// Receives the headers of each HTTP response as it arrives.
pub type HeaderObserver<'a> = &'a (dyn Fn(&HeaderMap) + Sync);

/// Executes adapter-built requests.
///
/// Implementations return `Ok` only for 2xx responses; every other outcome
/// is a classified [`TransportFailure`]. `observe` is called once per HTTP
/// response received, rejected and retried attempts included.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: OutboundRequest,
        observe: HeaderObserver<'_>,
    ) -> impl Future<Output = Result<RawResponse, TransportFailure>> + Send;
}

pub struct HttpTransport {
    client: Client,
    /// Additional attempts after the first failure, for retriable failures only.
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    async fn send_once(
        &self,
        request: &OutboundRequest,
        observe: HeaderObserver<'_>,
    ) -> Result<RawResponse, TransportFailure> {
        let url = request.url.as_str();
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFailure::classify(&e, url))?;

        let status = response.status();
        let headers = response.headers().clone();
        observe(&headers);
        if !status.is_success() {
            return Err(TransportFailure::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
                headers,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::classify(&e, url))?;

        Ok(RawResponse {
            url: request.url.clone(),
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: OutboundRequest,
        observe: HeaderObserver<'_>,
    ) -> Result<RawResponse, TransportFailure> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.send_once(&request, observe)
        })
        .await
    }
}
