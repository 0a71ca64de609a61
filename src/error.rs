//! Error types for the search box

use thiserror::Error;

/// Result type alias for search box operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Error types for suggestion lookup, search forwarding and preferences
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    HttpError {
        message: String,
        status_code: Option<u16>,
        response_body: Option<String>,
    },

    /// Configuration error, e.g. an unusable endpoint template
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Suggestion endpoint returned something other than the expected JSON shape
    #[error("Parsing error: {0}")]
    ParseError(String),

    /// Timeout error
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connectivity check reported no network
    #[error("Network unreachable")]
    Offline,

    /// A column/accessor combination the suggestion rows do not carry
    #[error("Unsupported {accessor} access on column {column}")]
    UnsupportedColumn {
        column: String,
        accessor: &'static str,
    },

    /// Row index past the end of a result set
    #[error("Row {index} out of range for result set of {len} rows")]
    RowOutOfRange { index: usize, len: usize },

    /// Generic error for unhandled cases
    #[error("Search box error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SearchError::Timeout {
                timeout_ms: crate::transport::HTTP_TIMEOUT_MS,
            }
        } else if error.is_status() {
            SearchError::HttpError {
                message: error.to_string(),
                status_code: error.status().map(|s| s.as_u16()),
                response_body: None,
            }
        } else {
            SearchError::HttpError {
                message: error.to_string(),
                status_code: None,
                response_body: None,
            }
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(error: serde_json::Error) -> Self {
        SearchError::ParseError(format!("JSON parsing failed: {error}"))
    }
}

impl From<std::io::Error> for SearchError {
    fn from(error: std::io::Error) -> Self {
        SearchError::Other(format!("IO error: {error}"))
    }
}
