//! Web search forwarding
//!
//! A submitted search box query is not handled here. It is turned into a
//! [`WebSearchRequest`] for the browser, pointed at the locale-specific
//! results page. The device location can ride along as POST data, but only
//! when the location provider exists and the user consented.

use crate::{
    endpoint::{CachedEndpoint, EndpointResolver, EndpointUse, LocaleSource, SystemLocale},
    error::SearchResult,
    utils::http::encode_query,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Source tag used when the intent does not name one
pub const DEFAULT_SOURCE: &str = "unknown";

/// Opaque key/value data the calling application attaches to a search
pub type AppData = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentAction {
    Search,
    Other(String),
}

/// Search request as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIntent {
    pub action: IntentAction,
    pub query: Option<String>,
    /// Where the search was started from, e.g. `home` or `browser`
    pub source: Option<String>,
    pub app_data: Option<AppData>,
}

impl SearchIntent {
    pub fn search(query: &str) -> Self {
        Self {
            action: IntentAction::Search,
            query: Some(query.to_string()),
            source: None,
            app_data: None,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_app_data(mut self, app_data: AppData) -> Self {
        self.app_data = Some(app_data);
        self
    }
}

/// User consent for sending location with searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationOptIn {
    /// User has not answered yet
    #[default]
    Unset,
    Consented,
    Declined,
}

impl fmt::Display for LocationOptIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationOptIn::Unset => write!(f, "unset"),
            LocationOptIn::Consented => write!(f, "consented"),
            LocationOptIn::Declined => write!(f, "declined"),
        }
    }
}

/// Decides whether location may be attached to a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationPolicy {
    /// Whether the system has the settings provider that owns the opt-in
    pub has_settings_provider: bool,
    pub opt_in: LocationOptIn,
}

impl LocationPolicy {
    pub fn new(has_settings_provider: bool, opt_in: LocationOptIn) -> Self {
        Self {
            has_settings_provider,
            opt_in,
        }
    }

    /// True once the user answered the opt-in either way
    pub fn user_responded(&self) -> bool {
        self.opt_in != LocationOptIn::Unset
    }

    /// False both when the user declined and when the system cannot ask;
    /// use [`user_responded`](Self::user_responded) to tell them apart.
    pub fn user_accepted(&self) -> bool {
        self.has_settings_provider && self.opt_in == LocationOptIn::Consented
    }

    /// Whether the opt-in prompt should be shown
    pub fn should_prompt(&self) -> bool {
        self.has_settings_provider && !self.user_responded()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl DeviceLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Form body carrying this location
    pub fn post_data(&self) -> String {
        format!("ll={:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Navigation request handed to the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSearchRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_data: Option<AppData>,
    /// Open in a fresh task rather than on top of the caller
    pub new_task: bool,
}

/// Builds browser requests from search intents
#[derive(Debug)]
pub struct SearchForwarder {
    resolver: EndpointResolver,
    endpoint: CachedEndpoint,
}

impl SearchForwarder {
    pub fn new(template: &str, client_id: Option<&str>) -> SearchResult<Self> {
        Ok(Self::with_resolver(EndpointResolver::new(
            template, client_id,
        )?))
    }

    pub fn with_resolver(resolver: EndpointResolver) -> Self {
        let endpoint = CachedEndpoint::new(
            resolver.clone(),
            Arc::new(SystemLocale),
            EndpointUse::Search,
        );
        Self { resolver, endpoint }
    }

    pub fn with_locale_source(mut self, source: Arc<dyn LocaleSource>) -> Self {
        self.endpoint = CachedEndpoint::new(self.resolver.clone(), source, EndpointUse::Search);
        self
    }

    /// Results-page URL for a query
    pub fn search_url(&self, query: &str, source: Option<&str>) -> String {
        let source = source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SOURCE);
        format!(
            "{}&source=android-{}&q={}",
            self.endpoint.get(),
            encode_query(source),
            encode_query(query)
        )
    }

    /// Turn an intent into a browser request.
    ///
    /// Only search actions with a non-empty query are forwarded. Location is
    /// attached when `policy` allows it and a fix is available.
    pub fn forward(
        &self,
        intent: &SearchIntent,
        policy: &LocationPolicy,
        location: Option<DeviceLocation>,
    ) -> Option<WebSearchRequest> {
        if intent.action != IntentAction::Search {
            log::debug!("Ignoring non-search intent {:?}", intent.action);
            return None;
        }

        let query = intent.query.as_deref().filter(|q| !q.is_empty())?;

        let post_data = if policy.user_accepted() {
            location.map(|l| l.post_data())
        } else {
            None
        };

        Some(WebSearchRequest {
            url: self.search_url(query, intent.source.as_deref()),
            post_data,
            app_data: intent.app_data.clone(),
            new_task: true,
        })
    }
}

impl Default for SearchForwarder {
    fn default() -> Self {
        Self::with_resolver(EndpointResolver::search())
    }
}
