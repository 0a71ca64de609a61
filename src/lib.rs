//! # searchbox
//!
//! Back end for a search box: remote autocomplete suggestions for partial
//! queries, and forwarding of submitted queries to a browser-bound search
//! request. Both use the same locale-aware endpoint derivation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use searchbox::{suggest, types::Locale};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let results = suggest("rust prog", Locale::new("en", "US")).await?;
//!
//!     for row in &results {
//!         println!("{} ({})", row.text, row.popularity);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod endpoint;
pub mod error;
pub mod search;
pub mod settings;
pub mod suggest;
pub mod transport;
pub mod types;
pub mod utils;

use std::sync::Arc;

// Re-export common types
pub use error::{SearchError, SearchResult as Result};
pub use search::{SearchForwarder, SearchIntent, WebSearchRequest};
pub use suggest::{LookupConfig, SuggestionLookup};
pub use types::{Locale, SuggestionResultSet, SuggestionRow};

/// Look up suggestions for `query` with the default endpoint and transport.
///
/// Lookup failures yield an empty result set; an `Err` means the HTTP
/// client could not be created.
///
/// # Examples
///
/// ```rust,no_run
/// use searchbox::{suggest, types::Locale};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let results = suggest("", Locale::new("en", "US")).await?;
/// assert!(results.is_empty());
/// # Ok(())
/// # }
/// ```
pub async fn suggest(query: &str, locale: Locale) -> Result<SuggestionResultSet> {
    let transport = transport::ReqwestTransport::new()?;
    let lookup = SuggestionLookup::new(LookupConfig::default(), Arc::new(transport))?
        .with_locale_source(Arc::new(locale));

    Ok(lookup.lookup(query).await)
}

/// Hint for resolving a failed lookup, shown by the CLI in strict mode
pub fn troubleshooting_info(error: &SearchError) -> String {
    match error {
        SearchError::HttpError {
            status_code: Some(403 | 429),
            ..
        } => "The suggestion endpoint is refusing requests. Try again later or check the client id."
            .to_string(),
        SearchError::HttpError {
            status_code: Some(404),
            ..
        } => "The suggestion endpoint was not found. Check the endpoint template.".to_string(),
        SearchError::HttpError {
            status_code: Some(500..=599),
            ..
        } => "The suggestion endpoint is experiencing server issues. Try again later.".to_string(),
        SearchError::HttpError { .. } => {
            "Could not reach the suggestion endpoint. Check your network connection.".to_string()
        }
        SearchError::Timeout { timeout_ms } => {
            format!("The suggestion endpoint did not answer within {timeout_ms}ms.")
        }
        SearchError::Offline => "No network connection is available.".to_string(),
        SearchError::ParseError(_) => {
            "The endpoint did not return suggestion JSON. Check that the template points at a suggestion endpoint."
                .to_string()
        }
        SearchError::ConfigError(_) => {
            "The endpoint template must contain a {language} placeholder.".to_string()
        }
        _ => "Unexpected error while looking up suggestions.".to_string(),
    }
}
