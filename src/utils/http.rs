//! HTTP utilities for talking to the suggestion endpoint

use crate::error::{SearchError, SearchResult};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse};
use reqwest::{Client, Response};
use std::time::Duration;
use url::form_urlencoded;

/// HTTP client wrapper with a fixed user agent and request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client sending `user_agent` and giving up after `timeout_ms`
    pub fn new(user_agent: &str, timeout_ms: u64) -> SearchResult<Self> {
        let timeout = Duration::from_millis(timeout_ms);
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SearchError::ConfigError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and return its status and body.
    ///
    /// Non-success statuses are returned as data; only transport failures
    /// become errors.
    pub async fn send(&self, request: &HttpRequest) -> SearchResult<HttpResponse> {
        let builder = match request.method {
            HttpMethod::Post => self.client.post(request.url.as_str()),
        };

        let response = builder
            .timeout(self.timeout)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        self.handle_response_text(response).await
    }

    /// Read the response body as text alongside its status
    async fn handle_response_text(&self, response: Response) -> SearchResult<HttpResponse> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse { status, body })
    }

    fn map_error(&self, error: reqwest::Error) -> SearchError {
        if error.is_timeout() {
            SearchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            error.into()
        }
    }
}

/// Form-encode a query as UTF-8 (spaces become `+`)
pub fn encode_query(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}
