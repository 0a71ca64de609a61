//! Verbose tracing of suggestion exchanges, gated by [`DebugOptions`]
//!
//! Everything goes through `log::debug!`, so it only shows up with
//! `RUST_LOG=debug` and the matching option turned on.

use crate::transport::{HttpRequest, HttpResponse};
use crate::types::DebugOptions;

/// Longest response body excerpt written to the log, in characters
const BODY_EXCERPT_CHARS: usize = 512;

/// Options for `--debug`: trace requests, responses and decoded rows
pub fn debug_all() -> DebugOptions {
    DebugOptions {
        enabled: true,
        log_requests: true,
        log_responses: true,
    }
}

/// Trace the outgoing suggestion request
pub fn log_request(options: &Option<DebugOptions>, request: &HttpRequest) {
    if options
        .as_ref()
        .is_some_and(|o| o.enabled && o.log_requests)
    {
        log::debug!("Suggestion request: {}", request_line(request));
    }
}

/// Trace the endpoint's answer; long bodies are cut short
pub fn log_response(options: &Option<DebugOptions>, response: &HttpResponse) {
    if options
        .as_ref()
        .is_some_and(|o| o.enabled && o.log_responses)
    {
        log::debug!(
            "Suggestion response: status {} body {}",
            response.status,
            body_excerpt(&response.body)
        );
    }
}

/// Trace how many rows a partial query decoded to
pub fn log_rows(options: &Option<DebugOptions>, partial: &str, rows: usize) {
    if options.as_ref().is_some_and(|o| o.enabled) {
        log::debug!("Suggestions received: {rows} rows for {partial:?}");
    }
}

fn request_line(request: &HttpRequest) -> String {
    format!("{} {}", request.method, request.url)
}

fn body_excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}
