//! Network capabilities injected into the suggestion lookup
//!
//! [`Transport`] executes a single HTTP exchange and [`Connectivity`] answers
//! whether it is worth trying at all. Both are traits so the lookup can run
//! against canned responses in tests.

use crate::{error::SearchResult, utils::http::HttpClient};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// Request timeout applied by the default transport
pub const HTTP_TIMEOUT_MS: u64 = 1000;

/// User agent sent with suggestion requests
pub const DEFAULT_USER_AGENT: &str = "searchbox/0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: String,
}

impl HttpRequest {
    /// POST with an empty body
    pub fn post(url: &str) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.to_string(),
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Executes one HTTP exchange.
///
/// Implementations return non-success statuses as an [`HttpResponse`]; an
/// `Err` means the exchange itself failed (I/O, timeout).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn execute(&self, request: &HttpRequest) -> SearchResult<HttpResponse>;
}

/// Cheap reachability check consulted before each lookup.
///
/// Awaited from inside the lookup, so implementations must not block the
/// runtime thread.
#[async_trait::async_trait]
pub trait Connectivity: Send + Sync + fmt::Debug {
    async fn is_online(&self) -> bool;
}

/// Transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: HttpClient,
}

impl ReqwestTransport {
    /// Transport with the default user agent and 1 second timeout
    pub fn new() -> SearchResult<Self> {
        Self::with_settings(DEFAULT_USER_AGENT, HTTP_TIMEOUT_MS)
    }

    pub fn with_settings(user_agent: &str, timeout_ms: u64) -> SearchResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(user_agent, timeout_ms)?,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> SearchResult<HttpResponse> {
        self.http_client.send(request).await
    }
}

/// Connectivity oracle that never short-circuits
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait::async_trait]
impl Connectivity for AlwaysOnline {
    async fn is_online(&self) -> bool {
        true
    }
}

/// Connectivity oracle that attempts a TCP connect to a known host
#[derive(Debug, Clone)]
pub struct TcpCheck {
    target: String,
    timeout: Duration,
}

impl TcpCheck {
    /// Check `target` (`host:port`) with the given connect timeout
    pub fn new(target: &str, timeout: Duration) -> Self {
        Self {
            target: target.to_string(),
            timeout,
        }
    }

}

#[async_trait::async_trait]
impl Connectivity for TcpCheck {
    /// Name resolution and connect both count against the timeout
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.target.as_str())).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                log::debug!("Could not reach {}: {e}", self.target);
                false
            }
            Err(_) => {
                log::debug!(
                    "No connection to {} within {}ms",
                    self.target,
                    self.timeout.as_millis()
                );
                false
            }
        }
    }
}
