//! Remote autocomplete suggestions
//!
//! [`SuggestionLookup`] turns a partial query into a [`SuggestionResultSet`]
//! by POSTing to the locale-specific suggestion endpoint. The endpoint
//! answers with a JSON array of four elements; element 1 holds the
//! suggestions and element 2 the matching popularity strings:
//!
//! ```text
//! ["ca", ["cat", "car"], ["12,000 results", "9,000 results"], []]
//! ```
//!
//! Lookups are best-effort. [`SuggestionLookup::lookup`] absorbs every
//! failure into an empty result set so a slow or broken endpoint never
//! reaches the input box; [`SuggestionLookup::try_lookup`] exposes the
//! underlying error for diagnostics.

use crate::{
    endpoint::{CachedEndpoint, EndpointResolver, EndpointUse, LocaleSource, SystemLocale},
    error::{SearchError, SearchResult},
    transport::{AlwaysOnline, Connectivity, HttpRequest, Transport},
    types::{ColumnLayout, DebugOptions, SuggestionResultSet},
    utils::{debug, http::encode_query},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Suggestion lookup configuration
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Endpoint template with `{language}`/`{country}` placeholders
    pub template: String,
    /// Optional client identifier appended to the endpoint
    pub client_id: Option<String>,
    /// Columns advertised by returned result sets
    pub layout: ColumnLayout,
    /// Debug options
    pub debug: Option<DebugOptions>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            template: crate::endpoint::DEFAULT_SUGGEST_TEMPLATE.to_string(),
            client_id: None,
            layout: ColumnLayout::WithIcons,
            debug: None,
        }
    }
}

impl LookupConfig {
    pub fn validate(&self) -> SearchResult<EndpointResolver> {
        EndpointResolver::new(&self.template, self.client_id.as_deref())
    }
}

/// Fetches suggestions for partial queries
#[derive(Debug)]
pub struct SuggestionLookup {
    resolver: EndpointResolver,
    endpoint: CachedEndpoint,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    layout: ColumnLayout,
    debug: Option<DebugOptions>,
}

impl SuggestionLookup {
    /// Create a lookup using the system locale and no connectivity check.
    ///
    /// Fails only if the configured template is unusable.
    pub fn new(config: LookupConfig, transport: Arc<dyn Transport>) -> SearchResult<Self> {
        let resolver = config.validate()?;
        let endpoint = CachedEndpoint::new(
            resolver.clone(),
            Arc::new(SystemLocale),
            EndpointUse::Suggest,
        );

        Ok(Self {
            resolver,
            endpoint,
            transport,
            connectivity: Arc::new(AlwaysOnline),
            layout: config.layout,
            debug: config.debug,
        })
    }

    /// Take the locale from `source` instead of the environment
    pub fn with_locale_source(mut self, source: Arc<dyn LocaleSource>) -> Self {
        self.endpoint = CachedEndpoint::new(self.resolver.clone(), source, EndpointUse::Suggest);
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Base URL queries are appended to; resolved on first call
    pub fn endpoint(&self) -> &str {
        self.endpoint.get()
    }

    /// Suggestions for `partial`, or an empty set if there are none or the
    /// lookup failed for any reason.
    pub async fn lookup(&self, partial: &str) -> SuggestionResultSet {
        match self.try_lookup(partial).await {
            Ok(results) => results,
            Err(SearchError::Offline) => {
                log::info!("Network unreachable, skipping suggestion lookup");
                self.empty()
            }
            Err(e) => {
                log::warn!("Suggestion lookup for {partial:?} failed: {e}");
                self.empty()
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but reports why no suggestions came back.
    ///
    /// Blank input is still `Ok` with an empty set and never touches the
    /// network.
    pub async fn try_lookup(&self, partial: &str) -> SearchResult<SuggestionResultSet> {
        if partial.trim().is_empty() {
            log::info!("Blank suggestion query, nothing to look up");
            return Ok(self.empty());
        }

        if !self.connectivity.is_online().await {
            return Err(SearchError::Offline);
        }

        let request = HttpRequest::post(&format!("{}{}", self.endpoint(), encode_query(partial)));
        debug::log_request(&self.debug, &request);

        let response = self.transport.execute(&request).await?;
        debug::log_response(&self.debug, &response);

        if response.status != 200 {
            return Err(SearchError::HttpError {
                message: format!("Suggestion endpoint returned status {}", response.status),
                status_code: Some(response.status),
                response_body: Some(response.body),
            });
        }

        let results = parse_suggestions(&response.body, self.layout)?;
        debug::log_rows(&self.debug, partial, results.len());
        Ok(results)
    }

    fn empty(&self) -> SuggestionResultSet {
        SuggestionResultSet::empty(self.layout)
    }
}

/// Decode a suggestion endpoint body.
///
/// The body must be a JSON array whose elements 1 and 2 are arrays of
/// strings; anything else is a [`SearchError::ParseError`].
pub fn parse_suggestions(body: &str, layout: ColumnLayout) -> SearchResult<SuggestionResultSet> {
    let document: Vec<Value> = serde_json::from_str(body)?;
    let suggestions = string_array(&document, 1, "suggestion")?;
    let popularity = string_array(&document, 2, "popularity")?;

    if suggestions.len() != popularity.len() {
        log::debug!(
            "Suggestion endpoint returned {} suggestions but {} popularity entries",
            suggestions.len(),
            popularity.len()
        );
    }

    Ok(SuggestionResultSet::from_parallel(
        &suggestions,
        &popularity,
        layout,
    ))
}

fn string_array(document: &[Value], index: usize, what: &str) -> SearchResult<Vec<String>> {
    let value = document.get(index).ok_or_else(|| {
        SearchError::ParseError(format!("Response has no {what} array at index {index}"))
    })?;

    Vec::<String>::deserialize(value).map_err(|e| {
        SearchError::ParseError(format!("Malformed {what} array at index {index}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, HttpResponse};
    use crate::types::{Column, Locale};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const CAT_CAR: &str = r#"[[],["cat","car"],["12,000 results","9,000 results"],[]]"#;

    // Transport spy returning a canned exchange
    #[derive(Debug)]
    struct FakeTransport {
        outcome: SearchResult<HttpResponse>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn respond(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn fail(error: SearchError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(error),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> Option<HttpRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: &HttpRequest) -> SearchResult<HttpResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    #[derive(Debug)]
    struct Offline;

    #[async_trait]
    impl Connectivity for Offline {
        async fn is_online(&self) -> bool {
            false
        }
    }

    // Connectivity check that takes a while to answer
    #[derive(Debug)]
    struct SlowCheck(Duration);

    #[async_trait]
    impl Connectivity for SlowCheck {
        async fn is_online(&self) -> bool {
            tokio::time::sleep(self.0).await;
            true
        }
    }

    fn lookup_with(transport: Arc<FakeTransport>) -> SuggestionLookup {
        SuggestionLookup::new(LookupConfig::default(), transport)
            .unwrap()
            .with_locale_source(Arc::new(Locale::new("en", "US")))
    }

    #[tokio::test]
    async fn test_blank_queries_skip_network() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport.clone());

        assert!(lookup.lookup("").await.is_empty());
        assert!(lookup.lookup("   ").await.is_empty());
        assert!(lookup.try_lookup("\t\n").await.unwrap().is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_returns_aligned_rows() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport.clone());

        let results = lookup.lookup("ca").await;
        assert_eq!(results.len(), 2);

        let row = results.row(0).unwrap();
        assert_eq!(row.id, 0);
        assert_eq!(row.text, "cat");
        assert_eq!(row.popularity, "12,000 results");
        assert_eq!(row.query, "cat");

        assert_eq!(results.get_long(1, Column::Id).unwrap(), 1);
        assert_eq!(results.get_string(1, Column::Text1).unwrap(), Some("car"));
        assert_eq!(
            results.get_string(1, Column::Text2).unwrap(),
            Some("9,000 results")
        );
        assert_eq!(results.get_string(1, Column::Query).unwrap(), Some("car"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport.clone());

        lookup.lookup("new york & co").await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert!(request.body.is_empty());
        assert_eq!(
            request.url,
            "https://www.google.com/complete/search?hl=en&gl=us&json=true&q=new+york+%26+co"
        );
    }

    #[tokio::test]
    async fn test_non_200_yields_empty() {
        let transport = FakeTransport::respond(500, "oops");
        let lookup = lookup_with(transport.clone());

        assert!(lookup.lookup("ca").await.is_empty());
        match lookup.try_lookup("ca").await {
            Err(SearchError::HttpError { status_code, .. }) => assert_eq!(status_code, Some(500)),
            other => panic!("Expected HttpError, got {other:?}"),
        }
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty() {
        let transport = FakeTransport::fail(SearchError::Timeout { timeout_ms: 1000 });
        let lookup = lookup_with(transport.clone());

        assert!(lookup.lookup("ca").await.is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_bodies_yield_empty() {
        let bodies = [
            r#"{"not":"an array"}"#,
            r#"["ca"]"#,
            r#"["ca",["cat"]]"#,
            r#"["ca","cat",["1"]]"#,
            r#"["ca",[1,2],["1","2"]]"#,
            "not json at all",
            "",
        ];

        for body in bodies {
            let transport = FakeTransport::respond(200, body);
            let lookup = lookup_with(transport);
            assert!(lookup.lookup("ca").await.is_empty(), "body: {body}");
            assert!(
                matches!(lookup.try_lookup("ca").await, Err(SearchError::ParseError(_))),
                "body: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_offline_short_circuits() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport.clone()).with_connectivity(Arc::new(Offline));

        assert!(lookup.lookup("ca").await.is_empty());
        assert!(matches!(
            lookup.try_lookup("ca").await,
            Err(SearchError::Offline)
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_connectivity_check_does_not_stall_runtime() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport.clone())
            .with_connectivity(Arc::new(SlowCheck(Duration::from_millis(500))));

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let started = Instant::now();
        let outcome =
            tokio::time::timeout(Duration::from_millis(50), lookup.try_lookup("ca")).await;
        let elapsed = started.elapsed();
        ticker.abort();

        assert!(outcome.is_err(), "outer timeout should cancel the lookup");
        assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
        assert!(ticks.load(Ordering::SeqCst) > 0);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_are_bounded() {
        let transport = FakeTransport::respond(200, r#"["q",["a","b","c"],["1 result"],[]]"#);
        let lookup = lookup_with(transport);

        let results = lookup.lookup("q").await;
        assert_eq!(results.len(), 3);
        assert_eq!(results.get_string(2, Column::Text2).unwrap(), Some(""));
        assert!(results.row(3).is_err());
    }

    #[tokio::test]
    async fn test_plain_layout_without_icons() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let config = LookupConfig {
            layout: ColumnLayout::Plain,
            ..Default::default()
        };
        let lookup = SuggestionLookup::new(config, transport).unwrap();

        let results = lookup.lookup("ca").await;
        assert_eq!(results.layout(), ColumnLayout::Plain);
        assert!(results.get_string(0, Column::Icon1).is_err());
    }

    #[tokio::test]
    async fn test_endpoint_resolved_from_locale_source() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = SuggestionLookup::new(LookupConfig::default(), transport)
            .unwrap()
            .with_locale_source(Arc::new(Locale::new("zh", "TW")));

        assert_eq!(
            lookup.endpoint(),
            "https://www.google.com/complete/search?hl=zh-TW&gl=tw&json=true&q="
        );
    }

    #[test]
    fn test_invalid_template_is_config_error() {
        let config = LookupConfig {
            template: "https://example.com/complete?".to_string(),
            ..Default::default()
        };
        let result = SuggestionLookup::new(config, FakeTransport::respond(200, CAT_CAR));
        assert!(matches!(result, Err(SearchError::ConfigError(_))));
    }

    #[test]
    fn test_lookup_from_sync_context() {
        let transport = FakeTransport::respond(200, CAT_CAR);
        let lookup = lookup_with(transport);
        let results = tokio_test::block_on(lookup.lookup("ca"));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_parse_ignores_outer_elements() {
        let results = parse_suggestions(
            r#"[{"anything":1},["x"],["7 results"],"trailing",42]"#,
            ColumnLayout::WithIcons,
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.rows()[0].popularity, "7 results");
    }
}
