//! Transport-neutral request and response values exchanged between adapters
//! and the transport.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};

/// A fully described HTTP request built by an adapter.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON body, sent with `Content-Type: application/json` unless the
    /// adapter already set one.
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn post_json(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// A received HTTP response, tagged with the URL of the request it answers.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL of the originating request (not of any redirect target), so
    /// adapters can recover addressing the payload does not echo back.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the body is not JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
